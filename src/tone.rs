use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::notes::{self, NoteId};
use crate::synth::{Synth, Waveform};

/// Fire-and-forget tone emitter. `trigger` must not block and the tone it
/// queues ends on its own.
pub trait ToneSource {
    /// Schedules one pluck of `note` at absolute clock time `time`.
    fn trigger(&mut self, time: f64, note: &NoteId) -> Result<()>;
    fn waveform(&self) -> Waveform;
    fn set_waveform(&mut self, waveform: Waveform);
}

/// Queues voices on the shared synth rendered by the output stream.
pub struct SynthTone {
    synth:    Arc<Mutex<Synth>>,
    waveform: Waveform,
}

impl SynthTone {
    pub fn new(synth: Arc<Mutex<Synth>>, waveform: Waveform) -> Self {
        Self { synth, waveform }
    }
}

impl ToneSource for SynthTone {
    fn trigger(&mut self, time: f64, note: &NoteId) -> Result<()> {
        let hz = notes::frequency(note)?;
        self.synth.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .schedule(time, hz as f32, self.waveform);
        Ok(())
    }

    fn waveform(&self) -> Waveform { self.waveform }

    fn set_waveform(&mut self, waveform: Waveform) { self.waveform = waveform; }
}

#[cfg(test)]
pub use recording::RecordingTone;
