use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

// ── Waveform ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Waveform { #[default] Sawtooth, Square, Triangle, Sine }

impl Waveform {
    pub fn next(self) -> Self {
        match self {
            Self::Sawtooth => Self::Square, Self::Square => Self::Triangle,
            Self::Triangle => Self::Sine,   Self::Sine   => Self::Sawtooth,
        }
    }
    pub fn name(self) -> &'static str {
        match self {
            Self::Sawtooth => "Sawtooth", Self::Square => "Square",
            Self::Triangle => "Triangle", Self::Sine   => "Sine",
        }
    }
    /// Lower-case key used in the preference cache.
    pub fn key(self) -> &'static str {
        match self {
            Self::Sawtooth => "sawtooth", Self::Square => "square",
            Self::Triangle => "triangle", Self::Sine   => "sine",
        }
    }

    /// One cycle sample at `phase` in `[0, 1)`.
    fn sample(self, phase: f32) -> f32 {
        match self {
            Self::Sine     => (phase * 2.0 * PI).sin(),
            Self::Square   => if phase < 0.5 { 1.0 } else { -1.0 },
            Self::Sawtooth => 2.0 * phase - 1.0,
            Self::Triangle => if phase < 0.5 { 4.0 * phase - 1.0 } else { 3.0 - 4.0 * phase },
        }
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sawtooth" | "saw" => Ok(Self::Sawtooth),
            "square"           => Ok(Self::Square),
            "triangle" | "tri" => Ok(Self::Triangle),
            "sine"             => Ok(Self::Sine),
            other => Err(format!("unknown waveform '{other}'")),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.key()) }
}

// ── Pluck envelope ────────────────────────────────────────────────────────────

/// Level at the trigger instant.
pub const PEAK_GAIN:  f32 = 0.3;
/// Level the exponential decay reaches at `DECAY_SECS`.
pub const FLOOR_GAIN: f32 = 0.01;
pub const DECAY_SECS: f32 = 0.15;
/// The oscillator is cut off after this long.
pub const GATE_SECS:  f32 = 0.1;

pub fn envelope(t: f32) -> f32 {
    if !(0.0..GATE_SECS).contains(&t) { return 0.0; }
    PEAK_GAIN * (FLOOR_GAIN / PEAK_GAIN).powf(t / DECAY_SECS)
}

// ── Voice ─────────────────────────────────────────────────────────────────────

/// One self-terminating tone burst.
#[derive(Clone, Debug)]
pub struct Voice {
    pub frequency:   f32,
    pub wave:        Waveform,
    pub start_frame: u64,
    phase:           f32,
    age:             u64,
}

impl Voice {
    pub fn new(frequency: f32, wave: Waveform, start_frame: u64) -> Self {
        Self { frequency, wave, start_frame, phase: 0.0, age: 0 }
    }

    pub fn is_finished(&self, sr: f32) -> bool {
        self.age as f32 / sr >= GATE_SECS
    }

    pub fn next_sample(&mut self, sr: f32) -> f32 {
        let level  = envelope(self.age as f32 / sr);
        let sample = self.wave.sample(self.phase);
        self.age  += 1;
        self.phase += self.frequency / sr;
        if self.phase >= 1.0 { self.phase -= 1.0; }
        sample * level
    }
}

// ── Synth ─────────────────────────────────────────────────────────────────────

/// Renders scheduled voices against its own frame counter, which is the
/// hardware clock: frame `n` is time `n / sample_rate`.
pub struct Synth {
    pub sample_rate: f32,
    frame:           u64,
    pending:         Vec<Voice>,
    voices:          Vec<Voice>,
}

impl Synth {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frame:   0,
            pending: Vec::with_capacity(32),
            voices:  Vec::with_capacity(16),
        }
    }

    /// Rebinds the synth to a freshly opened output stream.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.frame = 0;
        self.pending.clear();
        self.voices.clear();
    }

    pub fn frame(&self) -> u64 { self.frame }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize { self.pending.len() }

    #[cfg(test)]
    pub fn active_len(&self) -> usize { self.voices.len() }

    /// Queues a tone starting at `time` seconds. Times already rendered
    /// start on the next frame.
    pub fn schedule(&mut self, time: f64, frequency: f32, wave: Waveform) {
        let start_frame = (time.max(0.0) * self.sample_rate as f64).round() as u64;
        self.pending.push(Voice::new(frequency, wave, start_frame));
    }

    pub fn generate_sample(&mut self) -> f32 {
        let frame = self.frame;
        self.frame += 1;

        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].start_frame <= frame {
                let v = self.pending.swap_remove(i);
                self.voices.push(v);
            } else {
                i += 1;
            }
        }

        let sr = self.sample_rate;
        let mut mix = 0.0f32;
        for v in self.voices.iter_mut() { mix += v.next_sample(sr); }
        self.voices.retain(|v| !v.is_finished(sr));

        mix.tanh()
    }
}
