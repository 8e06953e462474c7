//! Error types for the sequencer core and its collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("note frequency not found for '{0}'")]
    UnknownNote(String),

    #[error("invalid note name '{0}'")]
    InvalidNote(String),

    #[error("invalid tempo {0} bpm")]
    InvalidTempo(f64),

    #[error("unknown pattern '{0}'")]
    UnknownPattern(String),

    #[error("audio output unavailable: {0}")]
    AudioUnavailable(String),

    #[error("audio stream error: {0}")]
    Audio(String),

    #[error("MIDI export failed: {0}")]
    MidiExport(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<cpal::BuildStreamError> for Error {
    fn from(e: cpal::BuildStreamError) -> Self {
        Error::AudioUnavailable(e.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for Error {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        Error::AudioUnavailable(e.to_string())
    }
}

impl From<cpal::PlayStreamError> for Error {
    fn from(e: cpal::PlayStreamError) -> Self {
        Error::Audio(e.to_string())
    }
}

impl From<cpal::PauseStreamError> for Error {
    fn from(e: cpal::PauseStreamError) -> Self {
        Error::Audio(e.to_string())
    }
}

impl From<midly::Error> for Error {
    fn from(e: midly::Error) -> Self {
        Error::MidiExport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
