use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

pub const SELECTED_PATTERN:  &str = "selectedPattern";
pub const SELECTED_WAVEFORM: &str = "selectedWaveform";
pub const BPM:               &str = "bpm";

/// Last-used selections, persisted as a flat JSON object. Storage problems
/// are logged and otherwise ignored.
#[derive(Debug, Default)]
pub struct Prefs {
    path:   Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl Prefs {
    /// Opens the cache at `path`; unreadable or corrupt files start empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match read_values(&path) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), "ignoring preferences: {e}");
                BTreeMap::new()
            }
        };
        Self { path: Some(path), values }
    }

    /// Cache that is never written to disk.
    pub fn in_memory() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<String> { self.values.get(key).cloned() }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if self.values.get(key) == Some(&value) { return; }
        self.values.insert(key.to_string(), value);
        if let Err(e) = self.save() {
            warn!("failed to save preferences: {e}");
        }
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        if let Some(dir) = path.parent() { fs::create_dir_all(dir)?; }
        fs::write(path, serde_json::to_string_pretty(&self.values)?)?;
        debug!(path = %path.display(), "preferences saved");
        Ok(())
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() { return Ok(BTreeMap::new()); }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        {
            let mut prefs = Prefs::open(&path);
            assert_eq!(prefs.get(BPM), None);
            prefs.set(SELECTED_PATTERN, "acidLine");
            prefs.set(BPM, "140");
        }
        let prefs = Prefs::open(&path);
        assert_eq!(prefs.get(SELECTED_PATTERN).as_deref(), Some("acidLine"));
        assert_eq!(prefs.get(BPM).as_deref(), Some("140"));
        assert_eq!(prefs.get(SELECTED_WAVEFORM), None);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "[1, 2,").unwrap();
        let mut prefs = Prefs::open(&path);
        assert_eq!(prefs.get(BPM), None);
        prefs.set(BPM, "120");
        assert_eq!(Prefs::open(&path).get(BPM).as_deref(), Some("120"));
    }

    #[test]
    fn test_unwritable_location_is_ignored() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let mut prefs = Prefs::open(blocker.join("prefs.json"));
        prefs.set(BPM, "99");
        assert_eq!(prefs.get(BPM).as_deref(), Some("99"));
    }

    #[test]
    fn test_in_memory() {
        let mut prefs = Prefs::in_memory();
        prefs.set(SELECTED_WAVEFORM, "sine");
        assert_eq!(prefs.get(SELECTED_WAVEFORM).as_deref(), Some("sine"));
    }
}
