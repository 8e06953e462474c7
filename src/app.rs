use std::time::Duration;

use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::midi_export;
use crate::notes;
use crate::pattern::{Catalog, CatalogEntry, Pattern};
use crate::playback::Playback;
use crate::prefs::{Prefs, BPM, SELECTED_PATTERN, SELECTED_WAVEFORM};
use crate::synth::Waveform;
use crate::tempo::Tempo;
use crate::ticker::TickSource;
use crate::tone::ToneSource;

/// Octave shown in the grid for a pattern with no notes.
const FALLBACK_OCTAVE: u8 = 3;

// ── App state ─────────────────────────────────────────────────────────────────

pub struct App<C: Clock, T: TickSource, S: ToneSource> {
    pub catalog:     Catalog,
    pub should_quit: bool,
    pub status_msg:  String,
    /// Grid shows only notes the pattern plays.
    pub hide_unused: bool,

    pattern_idx: usize,
    pattern:     Pattern,
    tempo:       Tempo,
    playback:    Playback<C, T, S>,
    prefs:       Prefs,
    config:      Config,
}

impl<C: Clock, T: TickSource, S: ToneSource> App<C, T, S> {
    /// Restores the last-used selections from `prefs`, falling back to the
    /// configured defaults.
    pub fn new(config: Config, prefs: Prefs, mut playback: Playback<C, T, S>) -> Self {
        let catalog = Catalog::builtin();

        let pattern_idx = prefs.get(SELECTED_PATTERN)
            .and_then(|id| catalog.index_of(&id))
            .or_else(|| catalog.index_of(&config.default_pattern))
            .unwrap_or(0);
        let pattern = catalog.at(pattern_idx).cloned()
            .unwrap_or_else(|| Pattern::new("empty", "Empty", Default::default()));

        let bpm = prefs.get(BPM)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(config.default_bpm);
        let tempo = Tempo::clamped(bpm, config.min_bpm, config.max_bpm).unwrap_or_default();

        let waveform = prefs.get(SELECTED_WAVEFORM)
            .and_then(|w| w.parse::<Waveform>().ok())
            .unwrap_or_else(|| config.waveform());
        playback.tone_mut().set_waveform(waveform);

        info!(pattern = pattern.id, bpm = tempo.bpm(), %waveform, "session restored");
        Self {
            catalog,
            should_quit: false,
            status_msg:  String::new(),
            hide_unused: false,
            pattern_idx,
            pattern,
            tempo,
            playback,
            prefs,
            config,
        }
    }

    // ── Transport controls ────────────────────────────────────────────────

    pub fn start_playback(&mut self) {
        match self.playback.start(&self.pattern, self.tempo) {
            Ok(()) => self.status_msg = "Playing".to_string(),
            Err(e) => {
                error!("cannot start playback: {e}");
                self.status_msg = format!("Cannot start playback: {e}");
            }
        }
    }

    pub fn stop_playback(&mut self) {
        self.playback.stop();
        self.status_msg = "Stopped".to_string();
    }

    pub fn toggle_playback(&mut self) {
        if self.is_playing() { self.stop_playback(); } else { self.start_playback(); }
    }

    /// Stops and rewinds to step 0.
    pub fn reset_playback(&mut self) {
        self.playback.reset();
        self.status_msg = "Rewound".to_string();
    }

    /// Runs a scheduler tick if one is due.
    pub fn poll_tick(&mut self) {
        self.playback.poll(&self.pattern, self.tempo);
    }

    pub fn shutdown(&mut self) {
        self.playback.dispose();
    }

    /// Parameter changes while playing restart from step 0.
    fn restart_if_playing(&mut self) {
        if !self.playback.is_playing() { return; }
        if let Err(e) = self.playback.restart(&self.pattern, self.tempo) {
            error!("restart failed: {e}");
            self.status_msg = format!("Cannot start playback: {e}");
        }
    }

    // ── Pattern selection ─────────────────────────────────────────────────

    pub fn select_pattern(&mut self, id: &str) -> Result<()> {
        let idx = self.catalog.index_of(id).ok_or_else(|| Error::UnknownPattern(id.to_string()))?;
        self.select_index(idx);
        Ok(())
    }

    /// Jumps back to the configured default pattern.
    pub fn select_default_pattern(&mut self) {
        let id = self.config.default_pattern.clone();
        if let Err(e) = self.select_pattern(&id) {
            warn!("{e}");
            self.status_msg = e.to_string();
        }
    }

    pub fn next_pattern(&mut self) {
        if self.catalog.is_empty() { return; }
        self.select_index((self.pattern_idx + 1) % self.catalog.len());
    }

    pub fn prev_pattern(&mut self) {
        if self.catalog.is_empty() { return; }
        let n = self.catalog.len();
        self.select_index((self.pattern_idx + n - 1) % n);
    }

    fn select_index(&mut self, idx: usize) {
        let Some(pattern) = self.catalog.at(idx).cloned() else { return };
        self.pattern_idx = idx;
        self.pattern = pattern;
        self.prefs.set(SELECTED_PATTERN, self.pattern.id);
        self.status_msg = format!("Pattern: {}", self.pattern.name);
        self.restart_if_playing();
    }

    // ── Waveform ──────────────────────────────────────────────────────────

    pub fn select_waveform(&mut self, waveform: Waveform) {
        self.playback.tone_mut().set_waveform(waveform);
        self.prefs.set(SELECTED_WAVEFORM, waveform.key());
        self.status_msg = format!("Wave: {}", waveform.name());
        self.restart_if_playing();
    }

    pub fn cycle_waveform(&mut self) {
        self.select_waveform(self.waveform().next());
    }

    // ── Tempo ─────────────────────────────────────────────────────────────

    /// Rejects non-positive values, clamps the rest into the configured range.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<()> {
        Tempo::new(bpm)?;
        let tempo = Tempo::clamped(bpm, self.config.min_bpm, self.config.max_bpm)?;
        if tempo == self.tempo { return Ok(()); }
        self.tempo = tempo;
        self.prefs.set(BPM, tempo.bpm().to_string());
        self.status_msg = format!("BPM: {:.0}", tempo.bpm());
        self.restart_if_playing();
        Ok(())
    }

    pub fn tempo_up(&mut self, by: f64) {
        let bpm = (self.tempo.bpm() + by).min(self.config.max_bpm);
        if let Err(e) = self.set_tempo(bpm) { warn!("{e}"); }
    }

    pub fn tempo_down(&mut self, by: f64) {
        let bpm = (self.tempo.bpm() - by).max(self.config.min_bpm);
        if let Err(e) = self.set_tempo(bpm) { warn!("{e}"); }
    }

    // ── Grid / export ─────────────────────────────────────────────────────

    pub fn toggle_hide_unused(&mut self) {
        self.hide_unused = !self.hide_unused;
        self.status_msg = if self.hide_unused { "Hiding unused notes" } else { "Showing all notes" }.to_string();
    }

    pub fn export_midi(&mut self) {
        match midi_export::write_to(&self.config.export_dir, &self.pattern, self.tempo) {
            Ok(path) => self.status_msg = format!("Exported {}", path.display()),
            Err(e) => {
                error!("{e}");
                self.status_msg = e.to_string();
            }
        }
    }

    // ── UI read helpers ───────────────────────────────────────────────────

    pub fn is_playing(&self) -> bool { self.playback.is_playing() }

    /// `-1` when stopped.
    pub fn current_step(&self) -> i32 { self.playback.current_step() }

    pub fn pattern(&self) -> &Pattern { &self.pattern }

    pub fn pattern_index(&self) -> usize { self.pattern_idx }

    /// Up to `n` selector entries around the current pattern, with their
    /// catalog positions.
    pub fn pattern_window(&self, n: usize) -> Vec<(usize, CatalogEntry)> {
        let start = self.pattern_idx
            .saturating_sub(n / 2)
            .min(self.catalog.len().saturating_sub(n));
        self.catalog.all().enumerate().skip(start).take(n).collect()
    }

    pub fn tempo(&self) -> Tempo { self.tempo }

    pub fn waveform(&self) -> Waveform { self.playback.tone().waveform() }

    /// Longest the event loop may sleep before the next scheduler tick.
    pub fn next_tick_in(&self) -> Option<Duration> { self.playback.time_to_next_tick() }

    /// Grid row labels, highest pitch first, over the pattern's octaves.
    pub fn grid_rows(&self) -> Vec<String> {
        let mut octaves = self.pattern.active_octaves();
        if octaves.is_empty() { octaves.push(FALLBACK_OCTAVE); }
        octaves.iter().rev()
            .flat_map(|&o| notes::octave_rows(o))
            .filter(|n| !self.hide_unused || self.pattern.uses_note(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ticker::ManualTicker;
    use crate::tone::RecordingTone;
    use tempfile::tempdir;

    type TestApp = App<ManualClock, ManualTicker, RecordingTone>;

    fn app_with(clock: &ManualClock, config: Config, prefs: Prefs) -> TestApp {
        let c = clock.clone();
        let playback = Playback::new(
            Box::new(move || Ok(c.clone())),
            ManualTicker::default(),
            RecordingTone::default(),
            config.tick_period(),
            config.lookahead(),
        );
        App::new(config, prefs, playback)
    }

    fn app(clock: &ManualClock) -> TestApp {
        app_with(clock, Config::default(), Prefs::in_memory())
    }

    #[test]
    fn test_defaults_without_prefs() {
        let app = app(&ManualClock::new());
        assert_eq!(app.pattern().id, "offBeat");
        assert_eq!(app.tempo().bpm(), 138.0);
        assert_eq!(app.waveform(), Waveform::Sawtooth);
        assert!(!app.is_playing());
        assert_eq!(app.current_step(), -1);
    }

    #[test]
    fn test_restores_from_prefs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        {
            let mut prefs = Prefs::open(&path);
            prefs.set(SELECTED_PATTERN, "acidLine");
            prefs.set(SELECTED_WAVEFORM, "square");
            prefs.set(BPM, "250");
        }
        let app = app_with(&ManualClock::new(), Config::default(), Prefs::open(&path));
        assert_eq!(app.pattern().id, "acidLine");
        assert_eq!(app.waveform(), Waveform::Square);
        assert_eq!(app.tempo().bpm(), 200.0);
    }

    #[test]
    fn test_toggle_playback() {
        let clock = ManualClock::new();
        let mut app = app(&clock);
        app.toggle_playback();
        assert!(app.is_playing());
        assert_eq!(app.current_step(), 0);
        assert_eq!(app.next_tick_in(), Some(Duration::from_millis(25)));
        app.toggle_playback();
        assert!(!app.is_playing());
        assert_eq!(app.current_step(), -1);
        assert_eq!(app.next_tick_in(), None);
    }

    #[test]
    fn test_pattern_change_while_playing_restarts() {
        let clock = ManualClock::new();
        let mut app = app(&clock);
        app.start_playback();
        for _ in 0..20 {
            clock.advance(0.025);
            app.playback.ticker_mut().fire();
            app.poll_tick();
        }
        assert!(app.current_step() > 0);

        app.next_pattern();
        assert!(app.is_playing());
        assert_eq!(app.current_step(), 0);
        assert_eq!(app.playback.transport().play_start(), clock.now());
    }

    #[test]
    fn test_select_unknown_pattern() {
        let mut app = app(&ManualClock::new());
        let err = app.select_pattern("nope").unwrap_err();
        assert!(matches!(err, Error::UnknownPattern(_)));
        assert_eq!(app.pattern().id, "offBeat");
        app.select_pattern("chicane").unwrap();
        assert_eq!(app.pattern().id, "chicane");
    }

    #[test]
    fn test_pattern_navigation_wraps() {
        let mut app = app(&ManualClock::new());
        app.select_pattern(app.catalog.at(0).unwrap().id).unwrap();
        app.prev_pattern();
        assert_eq!(app.pattern_index(), app.catalog.len() - 1);
        app.next_pattern();
        assert_eq!(app.pattern_index(), 0);
    }

    #[test]
    fn test_default_pattern_key() {
        let mut app = app(&ManualClock::new());
        app.select_pattern("chicane").unwrap();
        app.select_default_pattern();
        assert_eq!(app.pattern().id, "offBeat");

        let config = Config { default_pattern: "gone".to_string(), ..Config::default() };
        let mut app = app_with(&ManualClock::new(), config, Prefs::in_memory());
        let before = app.pattern_index();
        app.select_default_pattern();
        assert_eq!(app.pattern_index(), before);
        assert!(app.status_msg.contains("gone"));
    }

    #[test]
    fn test_pattern_window_stays_in_catalog() {
        let mut app = app(&ManualClock::new());
        let last = app.catalog.len() - 1;

        app.select_pattern(app.catalog.at(0).unwrap().id).unwrap();
        let window = app.pattern_window(4);
        assert_eq!(window.iter().map(|(i, _)| *i).collect::<Vec<_>>(), [0, 1, 2, 3]);

        app.prev_pattern();
        let window = app.pattern_window(4);
        assert_eq!(window.len(), 4);
        assert_eq!(window[3].0, last);
        assert_eq!(window[3].1.id, app.pattern().id);

        app.select_pattern("chicane").unwrap();
        let window = app.pattern_window(4);
        assert!(window.iter().any(|(i, e)| *i == app.pattern_index() && e.id == "chicane"));
    }

    #[test]
    fn test_tempo_rules() {
        let mut app = app(&ManualClock::new());
        assert!(matches!(app.set_tempo(0.0), Err(Error::InvalidTempo(_))));
        assert!(app.set_tempo(-5.0).is_err());
        assert_eq!(app.tempo().bpm(), 138.0);

        app.set_tempo(500.0).unwrap();
        assert_eq!(app.tempo().bpm(), 200.0);
        app.tempo_up(5.0);
        assert_eq!(app.tempo().bpm(), 200.0);

        app.set_tempo(62.0).unwrap();
        app.tempo_down(5.0);
        assert_eq!(app.tempo().bpm(), 60.0);
    }

    #[test]
    fn test_cycle_waveform_updates_tone() {
        let mut app = app(&ManualClock::new());
        app.cycle_waveform();
        assert_eq!(app.waveform(), Waveform::Square);
        assert_eq!(app.prefs.get(SELECTED_WAVEFORM).as_deref(), Some("square"));
    }

    #[test]
    fn test_grid_rows_follow_pattern() {
        let mut app = app(&ManualClock::new());
        app.select_pattern("chicane").unwrap();
        let rows = app.grid_rows();
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0], "B3");
        assert_eq!(rows[23], "C2");

        app.toggle_hide_unused();
        let rows = app.grid_rows();
        assert!(rows.iter().all(|r| app.pattern().uses_note(r)));
        assert!(rows.contains(&"A#2".to_string()));
    }

    #[test]
    fn test_export_midi_writes_file() {
        let dir = tempdir().unwrap();
        let config = Config { export_dir: dir.path().to_path_buf(), ..Config::default() };
        let mut app = app_with(&ManualClock::new(), config, Prefs::in_memory());
        app.export_midi();
        assert!(dir.path().join("offBeat.midi").exists());
        assert!(app.status_msg.starts_with("Exported"));
    }

    #[test]
    fn test_start_failure_reports_status() {
        let playback = Playback::new(
            Box::new(|| Err(Error::AudioUnavailable("no device".into()))),
            ManualTicker::default(),
            RecordingTone::default(),
            Duration::from_millis(25),
            Duration::from_millis(100),
        );
        let mut app: TestApp = App::new(Config::default(), Prefs::in_memory(), playback);
        app.start_playback();
        assert!(!app.is_playing());
        assert!(app.status_msg.starts_with("Cannot start playback"));
    }
}
