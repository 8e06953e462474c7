use std::time::Duration;

use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::error::Result;
use crate::indicator;
use crate::pattern::Pattern;
use crate::scheduler::{LookAheadScheduler, TickReport};
use crate::tempo::Tempo;
use crate::ticker::TickSource;
use crate::tone::ToneSource;
use crate::transport::{ClockOpener, Transport};

/// Transport, scheduler, indicator, tick source and tone source as one
/// owned unit. Ticks only run between `start` and `stop`.
pub struct Playback<C: Clock, T: TickSource, S: ToneSource> {
    transport:   Transport<C>,
    scheduler:   LookAheadScheduler,
    ticker:      T,
    tick_period: Duration,
    tone:        S,
}

impl<C: Clock, T: TickSource, S: ToneSource> Playback<C, T, S> {
    pub fn new(
        open_clock:  ClockOpener<C>,
        ticker:      T,
        tone:        S,
        tick_period: Duration,
        lookahead:   Duration,
    ) -> Self {
        Self {
            transport: Transport::new(open_clock),
            scheduler: LookAheadScheduler::new(lookahead),
            ticker,
            tick_period,
            tone,
        }
    }

    /// Starts or resumes, runs the first tick immediately so step 0 is not
    /// late, then arms the tick source.
    pub fn start(&mut self, pattern: &Pattern, tempo: Tempo) -> Result<()> {
        if self.transport.is_running() { return Ok(()); }
        self.transport.start()?;
        self.tick(pattern, tempo);
        self.ticker.arm(self.tick_period);
        info!(pattern = pattern.id, bpm = tempo.bpm(), "playing");
        Ok(())
    }

    /// Halts the tick source, then pauses the transport.
    pub fn stop(&mut self) {
        self.ticker.disarm();
        self.transport.stop();
    }

    pub fn reset(&mut self) {
        self.ticker.disarm();
        self.transport.reset();
    }

    /// Discontinuous restart from step 0 with new parameters.
    pub fn restart(&mut self, pattern: &Pattern, tempo: Tempo) -> Result<()> {
        debug!(pattern = pattern.id, bpm = tempo.bpm(), "restarting");
        self.reset();
        self.start(pattern, tempo)
    }

    pub fn dispose(&mut self) {
        self.ticker.disarm();
        self.transport.dispose();
    }

    /// Runs a tick if the tick source says one is due.
    pub fn poll(&mut self, pattern: &Pattern, tempo: Tempo) -> Option<TickReport> {
        if !self.ticker.take_due() { return None; }
        Some(self.tick(pattern, tempo))
    }

    /// One scheduler pass followed by the indicator update.
    pub fn tick(&mut self, pattern: &Pattern, tempo: Tempo) -> TickReport {
        if !self.transport.is_running() { return TickReport::default(); }
        let Some(now) = self.transport.now() else { return TickReport::default() };

        let (dispatched, skipped) =
            self.scheduler.dispatch(&mut self.transport, now, pattern, tempo, &mut self.tone);
        let step_changed = indicator::refresh(&mut self.transport, now, tempo.seconds_per_step());

        let report = TickReport { dispatched, skipped, step_changed };
        if report != TickReport::default() { trace!(?report, "tick"); }
        report
    }

    pub fn is_playing(&self) -> bool { self.transport.is_running() }

    /// `-1` when stopped, else `0..=15`.
    pub fn current_step(&self) -> i32 {
        self.transport.current_step().map_or(-1, |s| s as i32)
    }

    pub fn time_to_next_tick(&self) -> Option<Duration> { self.ticker.time_to_next() }

    pub fn tone(&self) -> &S { &self.tone }

    pub fn tone_mut(&mut self) -> &mut S { &mut self.tone }

    #[cfg(test)]
    pub fn ticker(&self) -> &T { &self.ticker }

    #[cfg(test)]
    pub fn ticker_mut(&mut self) -> &mut T { &mut self.ticker }

    #[cfg(test)]
    pub fn transport(&self) -> &Transport<C> { &self.transport }
}

impl<C: Clock, T: TickSource, S: ToneSource> Drop for Playback<C, T, S> {
    fn drop(&mut self) { self.dispose(); }
}
