//! Audio-hardware time as seen by the transport.

use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState { Running, Suspended, Closed }

/// A monotonic clock in seconds that freezes while suspended and is the
/// reference every scheduled tone is placed against.
pub trait Clock {
    fn now(&self) -> f64;
    fn state(&self) -> ClockState;
    fn suspend(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn close(&mut self);
}

#[cfg(test)]
pub use manual::ManualClock;
