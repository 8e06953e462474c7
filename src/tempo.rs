use crate::error::{Error, Result};
use crate::pattern::STEPS;

/// Slack for float error accumulated by the additive dispatch cursor, so a
/// cursor that lands a hair below a step boundary still maps to that step.
const STEP_EPSILON: f64 = 1e-6;

/// Beats per minute. Always finite and positive.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Tempo(f64);

impl Tempo {
    pub fn new(bpm: f64) -> Result<Self> {
        if bpm.is_finite() && bpm > 0.0 { Ok(Self(bpm)) } else { Err(Error::InvalidTempo(bpm)) }
    }

    /// UI-side guard: clamps into `[min, max]`, falling back to `min` for NaN.
    pub fn clamped(bpm: f64, min: f64, max: f64) -> Result<Self> {
        let bpm = if bpm.is_nan() { min } else { bpm.clamp(min, max) };
        Self::new(bpm)
    }

    pub fn bpm(self) -> f64 { self.0 }

    /// Sixteenth-note duration: 16 steps make one bar of 4/4.
    pub fn seconds_per_step(self) -> f64 { 60.0 / self.0 / 4.0 }
}

impl Default for Tempo {
    fn default() -> Self { Self(138.0) }
}

/// Pattern step sounding at `elapsed` seconds of effective playback.
/// Shared by the scheduler and the step indicator so both stay phase-locked.
pub fn step_at(elapsed: f64, seconds_per_step: f64) -> usize {
    let elapsed = elapsed.max(0.0);
    ((elapsed / seconds_per_step + STEP_EPSILON).floor() as u64 % STEPS as u64) as usize
}
