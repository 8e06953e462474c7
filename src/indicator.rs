//! Currently sounding step, derived from the clock rather than the dispatch
//! cursor so the grid never runs ahead of what the listener hears.

use crate::clock::Clock;
use crate::tempo::step_at;
use crate::transport::Transport;

/// Step sounding at clock time `now`.
pub fn step_now<C: Clock>(transport: &Transport<C>, now: f64, seconds_per_step: f64) -> usize {
    step_at(transport.effective_elapsed(now), seconds_per_step)
}

/// Recomputes the current step and stores it on the transport.
/// Returns the new step only when it differs from the stored one.
pub fn refresh<C: Clock>(transport: &mut Transport<C>, now: f64, seconds_per_step: f64) -> Option<usize> {
    if !transport.is_running() { return None; }
    let step = step_now(transport, now, seconds_per_step);
    if transport.current_step() == Some(step) { return None; }
    transport.set_current_step(step);
    Some(step)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::pattern::Pattern;
    use crate::scheduler::LookAheadScheduler;
    use crate::tempo::Tempo;
    use crate::tone::RecordingTone;

    fn running(clock: &ManualClock) -> Transport<ManualClock> {
        let c = clock.clone();
        let mut t = Transport::new(Box::new(move || Ok(c.clone())));
        t.start().unwrap();
        t
    }

    #[test]
    fn test_emits_only_on_change() {
        let clock = ManualClock::new();
        let mut t = running(&clock);
        let sps = 0.125;

        assert_eq!(refresh(&mut t, clock.now(), sps), Some(0));
        clock.advance(0.05);
        assert_eq!(refresh(&mut t, clock.now(), sps), None);
        clock.advance(0.1);
        assert_eq!(refresh(&mut t, clock.now(), sps), Some(1));
        assert_eq!(t.current_step(), Some(1));
    }

    #[test]
    fn test_silent_when_stopped() {
        let clock = ManualClock::new();
        let mut t = running(&clock);
        refresh(&mut t, clock.now(), 0.125);
        t.stop();
        assert_eq!(t.current_step(), None);
        assert_eq!(refresh(&mut t, clock.now(), 0.125), None);
    }

    #[test]
    fn test_agrees_with_scheduler() {
        let clock = ManualClock::new();
        let mut t = running(&clock);
        let tempo = Tempo::new(138.0).unwrap();
        let sps = tempo.seconds_per_step();
        let pattern = Pattern::generate("idx", "Index", |_| Some("C3"));
        let scheduler = LookAheadScheduler::new(Duration::from_millis(100));
        let mut tone = RecordingTone::default();

        for _ in 0..300 {
            clock.advance(0.025);
            scheduler.dispatch(&mut t, clock.now(), &pattern, tempo, &mut tone);
            refresh(&mut t, clock.now(), sps);
        }
        // at every dispatched instant the indicator formula names the same step
        for (k, (time, _)) in tone.fired.iter().enumerate() {
            assert_eq!(step_now(&t, *time, sps), k % 16, "dispatch {k}");
        }
        // the shown step has already been dispatched
        let shown = t.current_step().unwrap();
        let last_dispatched = (tone.fired.len() - 1) % 16;
        let behind = (last_dispatched + 16 - shown) % 16;
        assert!(behind <= 1, "shown {shown}, last dispatched {last_dispatched}");
    }
}
