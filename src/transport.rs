use tracing::{debug, info, warn};

use crate::clock::{Clock, ClockState};
use crate::error::Result;

pub type ClockOpener<C> = Box<dyn FnMut() -> Result<C>>;

/// Play/pause/reset state and pause-time accounting over one hardware clock.
///
/// Times are clock seconds. The clock is opened lazily on the first `start`
/// and owned exclusively until `dispose`.
pub struct Transport<C: Clock> {
    open_clock:   ClockOpener<C>,
    clock:        Option<C>,
    running:      bool,
    /// A paused position exists that `start` should continue from.
    live:         bool,
    play_start:   f64,
    total_paused: f64,
    last_pause:   Option<f64>,
    next_due:     f64,
    current_step: Option<usize>,
}

impl<C: Clock> Transport<C> {
    pub fn new(open_clock: ClockOpener<C>) -> Self {
        Self {
            open_clock,
            clock:        None,
            running:      false,
            live:         false,
            play_start:   0.0,
            total_paused: 0.0,
            last_pause:   None,
            next_due:     0.0,
            current_step: None,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.running { return Ok(()); }

        let clock = match self.clock.take() {
            Some(c) => c,
            None => (self.open_clock)()?,
        };
        let clock = self.clock.insert(clock);

        if clock.state() == ClockState::Suspended {
            clock.resume()?;
        }
        // A clock that refused to suspend kept running; fold the gap either way.
        if let Some(paused_at) = self.last_pause {
            let gap = (clock.now() - paused_at).max(0.0);
            self.total_paused += gap;
            self.next_due     += gap;
            debug!(gap, total_paused = self.total_paused, "resumed");
        }

        let now = clock.now();
        if !self.live {
            self.play_start   = now;
            self.total_paused = 0.0;
            self.next_due     = now;
            self.live         = true;
            info!(at = now, "playback started");
        }
        self.last_pause = None;
        self.running    = true;
        Ok(())
    }

    /// Pauses at the current position. Idempotent.
    pub fn stop(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            if (self.running || self.live) && self.last_pause.is_none() {
                self.last_pause = Some(clock.now());
            }
            if clock.state() == ClockState::Running {
                if let Err(e) = clock.suspend() {
                    warn!("failed to suspend audio clock: {e}");
                }
            }
        }
        if self.running { debug!("playback paused"); }
        self.running      = false;
        self.current_step = None;
    }

    /// Stops and forgets the position; the next `start` begins at step 0.
    pub fn reset(&mut self) {
        self.stop();
        self.live         = false;
        self.play_start   = 0.0;
        self.total_paused = 0.0;
        self.last_pause   = None;
        self.next_due     = 0.0;
    }

    /// Resets and releases the clock.
    pub fn dispose(&mut self) {
        self.reset();
        if let Some(mut clock) = self.clock.take() {
            clock.close();
            info!("transport disposed");
        }
    }

    pub fn is_running(&self) -> bool { self.running }

    pub fn now(&self) -> Option<f64> { self.clock.as_ref().map(Clock::now) }

    /// Playback time at clock time `t`, excluding suspended intervals.
    pub fn effective_elapsed(&self, t: f64) -> f64 {
        t - self.play_start - self.total_paused
    }

    pub fn next_due(&self) -> f64 { self.next_due }

    pub(crate) fn advance_cursor(&mut self, seconds_per_step: f64) {
        self.next_due += seconds_per_step;
    }

    pub fn current_step(&self) -> Option<usize> { self.current_step }

    pub(crate) fn set_current_step(&mut self, step: usize) {
        self.current_step = Some(step);
    }

    #[cfg(test)]
    pub fn play_start(&self) -> f64 { self.play_start }

    #[cfg(test)]
    pub fn total_paused(&self) -> f64 { self.total_paused }
}
