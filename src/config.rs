use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::synth::Waveform;

pub const APP_NAME: &str = "bassline";
const CONFIG_ENV: &str = "BASSLINE_CONFIG";

/// Runtime tunables, read from `config.json`. Missing fields take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheduler tick period.
    pub tick_ms:          u64,
    /// How far ahead of the clock notes are dispatched.
    pub lookahead_ms:     u64,
    pub min_bpm:          f64,
    pub max_bpm:          f64,
    pub default_bpm:      f64,
    pub default_pattern:  String,
    pub default_waveform: String,
    pub export_dir:       PathBuf,
    pub log_level:        String,
    pub log_file:         Option<PathBuf>,
    /// UI redraw budget.
    pub frame_ms:         u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms:          25,
            lookahead_ms:     100,
            min_bpm:          60.0,
            max_bpm:          200.0,
            default_bpm:      138.0,
            default_pattern:  "offBeat".to_string(),
            default_waveform: "sawtooth".to_string(),
            export_dir:       PathBuf::from("."),
            log_level:        "info".to_string(),
            log_file:         None,
            frame_ms:         16,
        }
    }
}

impl Config {
    /// `$BASSLINE_CONFIG`, else `<config dir>/bassline/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| config_dir().map(|d| d.join("config.json")))
    }

    /// Loads and validates; a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) if p.exists() => {
                let text = fs::read_to_string(p)?;
                let cfg: Config = serde_json::from_str(&text)?;
                info!(path = %p.display(), "config loaded");
                cfg
            }
            _ => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(Error::InvalidConfig("tick_ms must be positive".into()));
        }
        if self.tick_ms >= self.lookahead_ms {
            return Err(Error::InvalidConfig(format!(
                "tick_ms ({}) must be smaller than lookahead_ms ({})",
                self.tick_ms, self.lookahead_ms
            )));
        }
        if !(self.min_bpm > 0.0 && self.min_bpm <= self.max_bpm && self.max_bpm.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "bpm range {}..={} is invalid", self.min_bpm, self.max_bpm
            )));
        }
        if self.default_waveform.parse::<Waveform>().is_err() {
            return Err(Error::InvalidConfig(format!(
                "unknown default_waveform '{}'", self.default_waveform
            )));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration { Duration::from_millis(self.tick_ms) }

    pub fn lookahead(&self) -> Duration { Duration::from_millis(self.lookahead_ms) }

    pub fn frame_budget(&self) -> Duration { Duration::from_millis(self.frame_ms) }

    pub fn waveform(&self) -> Waveform {
        self.default_waveform.parse().unwrap_or_default()
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_NAME)
                .join("bassline.log")
        })
    }

    pub fn prefs_path(&self) -> Option<PathBuf> {
        config_dir().map(|d| d.join("prefs.json"))
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
