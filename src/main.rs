mod app;
mod audio;
mod clock;
mod config;
mod error;
mod indicator;
mod midi_export;
mod notes;
mod pattern;
mod playback;
mod prefs;
mod scheduler;
mod synth;
mod tempo;
mod ticker;
mod tone;
mod transport;
mod ui;

use anyhow::{Context, Result};
use app::App;
use audio::AudioClock;
use config::Config;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use playback::Playback;
use prefs::Prefs;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs, io, sync::{Arc, Mutex}};
use synth::Synth;
use ticker::IntervalTicker;
use tone::SynthTone;
use tracing::info;
use tracing_subscriber::EnvFilter;

type LiveApp = App<AudioClock, IntervalTicker, SynthTone>;

fn main() -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load(config_path.as_deref()).context("loading config")?;
    if let Err(e) = init_logging(&config) {
        eprintln!("logging disabled: {e:#}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "bassline starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let result = run(&mut terminal, config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    if let Err(e) = result { eprintln!("Error: {:?}", e); }
    Ok(())
}

/// The terminal owns stdout, so logs go to a file.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path();
    if let Some(dir) = path.parent() { fs::create_dir_all(dir)?; }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

fn build_app(config: Config) -> LiveApp {
    let synth = Arc::new(Mutex::new(Synth::new(44100.0)));
    let tone  = SynthTone::new(Arc::clone(&synth), config.waveform());
    let opener_synth = Arc::clone(&synth);
    let playback = Playback::new(
        Box::new(move || AudioClock::open(Arc::clone(&opener_synth))),
        IntervalTicker::new(),
        tone,
        config.tick_period(),
        config.lookahead(),
    );
    let prefs = match config.prefs_path() {
        Some(path) => Prefs::open(path),
        None => Prefs::in_memory(),
    };
    App::new(config, prefs, playback)
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, config: Config) -> Result<()> {
    let frame = config.frame_budget();
    let mut app = build_app(config);

    loop {
        app.poll_tick();
        terminal.draw(|f| ui::draw(f, &app))?;

        let timeout = app.next_tick_in().map_or(frame, |t| t.min(frame));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release { continue; }
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => app.should_quit = true,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }

                    KeyCode::Char(' ') | KeyCode::Enter => app.toggle_playback(),
                    KeyCode::Backspace => app.reset_playback(),

                    KeyCode::Left     => app.prev_pattern(),
                    KeyCode::Right    => app.next_pattern(),
                    KeyCode::Home     => app.select_default_pattern(),
                    KeyCode::Up       => app.tempo_up(1.0),
                    KeyCode::Down     => app.tempo_down(1.0),
                    KeyCode::PageUp   => app.tempo_up(5.0),
                    KeyCode::PageDown => app.tempo_down(5.0),

                    KeyCode::Char('w') => app.cycle_waveform(),
                    KeyCode::Char('h') => app.toggle_hide_unused(),
                    KeyCode::Char('m') => app.export_midi(),
                    _ => {}
                }
            }
        }
        if app.should_quit { break; }
    }

    app.shutdown();
    info!("bassline exiting");
    Ok(())
}
