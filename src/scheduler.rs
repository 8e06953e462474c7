use std::time::Duration;

use tracing::{trace, warn};

use crate::clock::Clock;
use crate::pattern::Pattern;
use crate::tempo::{step_at, Tempo};
use crate::tone::ToneSource;
use crate::transport::Transport;

/// Outcome of one scheduler tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub dispatched:   usize,
    pub skipped:      usize,
    pub step_changed: Option<usize>,
}

/// Dispatches every step due inside the look-ahead window, stamping each
/// tone with its exact due time so tick jitter never reaches the audio.
#[derive(Clone, Copy, Debug)]
pub struct LookAheadScheduler {
    window: f64,
}

impl LookAheadScheduler {
    pub fn new(window: Duration) -> Self {
        Self { window: window.as_secs_f64() }
    }

    /// Runs the dispatch loop at clock time `now` and returns
    /// `(dispatched, skipped)`.
    pub fn dispatch<C: Clock, S: ToneSource + ?Sized>(
        &self,
        transport: &mut Transport<C>,
        now:       f64,
        pattern:   &Pattern,
        tempo:     Tempo,
        tone:      &mut S,
    ) -> (usize, usize) {
        let sps = tempo.seconds_per_step();
        let horizon = now + self.window;
        let (mut dispatched, mut skipped) = (0, 0);

        while transport.next_due() < horizon {
            let due  = transport.next_due();
            let step = step_at(transport.effective_elapsed(due), sps);
            if let Some(note) = pattern.slot(step) {
                match tone.trigger(due, note) {
                    Ok(()) => {
                        dispatched += 1;
                        trace!(step, %note, at = due, "dispatch");
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!(step, pattern = pattern.id, "skipping step: {e}");
                    }
                }
            }
            transport.advance_cursor(sps);
        }
        (dispatched, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notes::NoteId;
    use crate::pattern::{Slot, STEPS};
    use crate::tone::RecordingTone;
    use approx::assert_abs_diff_eq;

    fn setup(clock: &ManualClock) -> Transport<ManualClock> {
        let c = clock.clone();
        let mut t = Transport::new(Box::new(move || Ok(c.clone())));
        t.start().unwrap();
        t
    }

    fn window() -> LookAheadScheduler { LookAheadScheduler::new(Duration::from_millis(100)) }

    fn every_step(note: &'static str) -> Pattern {
        Pattern::generate("all", "All", move |_| Some(note))
    }

    #[test]
    fn test_single_tick_fills_window() {
        let clock = ManualClock::new();
        let mut t = setup(&clock);
        let mut tone = RecordingTone::default();
        let tempo = Tempo::new(120.0).unwrap();

        let (n, skipped) = window().dispatch(&mut t, clock.now(), &every_step("C3"), tempo, &mut tone);
        // only the step due at 0.0 falls before the 0.1 s horizon
        assert_eq!((n, skipped), (1, 0));
        assert_eq!(tone.fired[0].0, 0.0);
        assert_abs_diff_eq!(t.next_due(), 0.125);
    }

    #[test]
    fn test_cursor_is_drift_free_under_jitter() {
        let clock = ManualClock::new();
        let mut t = setup(&clock);
        let mut tone = RecordingTone::default();
        let tempo = Tempo::new(138.0).unwrap();
        let sps = tempo.seconds_per_step();
        let pattern = every_step("C3");

        let jitter = [0.025, 0.031, 0.019, 0.047, 0.025, 0.003, 0.060, 0.022];
        for k in 0..400 {
            clock.advance(jitter[k % jitter.len()]);
            window().dispatch(&mut t, clock.now(), &pattern, tempo, &mut tone);
        }
        assert!(tone.fired.len() > 100);
        for (k, (time, _)) in tone.fired.iter().enumerate() {
            assert_abs_diff_eq!(*time, k as f64 * sps, epsilon = 1e-9);
        }
        // strictly increasing, no duplicates
        assert!(tone.fired.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_late_tick_catches_up_without_loss() {
        let clock = ManualClock::new();
        let mut t = setup(&clock);
        let mut tone = RecordingTone::default();
        let tempo = Tempo::new(120.0).unwrap();

        clock.advance(1.0);
        let (n, _) = window().dispatch(&mut t, clock.now(), &every_step("C3"), tempo, &mut tone);
        // due times 0.0 ..= 1.0 are all < 1.1
        assert_eq!(n, 9);
    }

    #[test]
    fn test_unknown_note_is_skipped() {
        let clock = ManualClock::new();
        let mut t = setup(&clock);
        let mut tone = RecordingTone::default();
        let tempo = Tempo::new(120.0).unwrap();
        let mut slots: [Slot; STEPS] = Default::default();
        slots[0] = Some(NoteId::from_static("C3"));
        slots[1] = Some(NoteId::from_static("C9"));
        slots[2] = Some(NoteId::from_static("D3"));
        let pattern = Pattern::new("bad", "Bad", slots);

        clock.advance(0.3);
        let (n, skipped) = window().dispatch(&mut t, clock.now(), &pattern, tempo, &mut tone);
        assert_eq!((n, skipped), (2, 1));
        let notes: Vec<&str> = tone.fired.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(notes, ["C3", "D3"]);
        assert_abs_diff_eq!(tone.fired[1].0, 0.25);
    }

    #[test]
    fn test_138_bpm_single_hit() {
        let clock = ManualClock::new();
        clock.set(10.0);
        let mut t = setup(&clock);
        let mut tone = RecordingTone::default();
        let tempo = Tempo::new(138.0).unwrap();
        let pattern = Pattern::from_hits("one", "One", &[(1, "C3")]);

        for _ in 0..160 {
            clock.advance(0.025);
            window().dispatch(&mut t, clock.now(), &pattern, tempo, &mut tone);
        }
        let bar = 16.0 * tempo.seconds_per_step();
        assert_abs_diff_eq!(tone.fired[0].0, 10.0 + 0.108_695_652, epsilon = 1e-6);
        assert_abs_diff_eq!(tone.fired[1].0 - tone.fired[0].0, bar, epsilon = 1e-9);
        assert_abs_diff_eq!(bar, 1.739_130_43, epsilon = 1e-6);
    }
}
