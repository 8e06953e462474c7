use std::time::{Duration, Instant};

/// Periodic wake-up source driving the scheduler. Ticks may arrive late;
/// the scheduler's look-ahead window absorbs the jitter.
pub trait TickSource {
    fn arm(&mut self, period: Duration);
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
    /// Consumes a due tick. Missed ticks collapse into one.
    fn take_due(&mut self) -> bool;
    /// Time until the next tick, `None` when disarmed.
    fn time_to_next(&self) -> Option<Duration>;
}

/// Deadline-based ticker polled from the UI event loop.
#[derive(Debug, Default)]
pub struct IntervalTicker {
    period: Duration,
    next:   Option<Instant>,
}

impl IntervalTicker {
    pub fn new() -> Self { Self::default() }
}

impl TickSource for IntervalTicker {
    fn arm(&mut self, period: Duration) {
        self.period = period;
        self.next   = Some(Instant::now() + period);
    }

    fn disarm(&mut self) { self.next = None; }

    fn is_armed(&self) -> bool { self.next.is_some() }

    fn take_due(&mut self) -> bool {
        let Some(next) = self.next else { return false };
        let now = Instant::now();
        if now < next { return false; }
        let following = next + self.period;
        self.next = Some(if following <= now { now + self.period } else { following });
        true
    }

    fn time_to_next(&self) -> Option<Duration> {
        self.next.map(|n| n.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
pub use manual::ManualTicker;

#[cfg(test)]
mod manual {
    use std::time::Duration;

    use super::TickSource;

    /// Fires only when the test says so, and only while armed.
    #[derive(Debug, Default)]
    pub struct ManualTicker {
        pub period:  Option<Duration>,
        pub arms:    usize,
        pub disarms: usize,
        pending:     bool,
    }

    impl ManualTicker {
        pub fn fire(&mut self) { self.pending = true; }
    }

    impl TickSource for ManualTicker {
        fn arm(&mut self, period: Duration) {
            self.period = Some(period);
            self.arms += 1;
        }

        fn disarm(&mut self) {
            if self.period.take().is_some() { self.disarms += 1; }
            self.pending = false;
        }

        fn is_armed(&self) -> bool { self.period.is_some() }

        fn take_due(&mut self) -> bool {
            self.is_armed() && std::mem::take(&mut self.pending)
        }

        fn time_to_next(&self) -> Option<Duration> {
            self.period.map(|p| if self.pending { Duration::ZERO } else { p })
        }
    }
}
