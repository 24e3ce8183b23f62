use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::app_cache_dir;

const PREFS_FILE: &str = "ui.json";
const PREFS_VERSION: u32 = 1;

/// Small bits of UI state remembered between sessions.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UiPrefs {
    pub version: u32,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub scout_name: Option<String>,
    #[serde(default)]
    pub competition: Option<String>,
}

pub fn load_prefs() -> UiPrefs {
    prefs_path()
        .and_then(|path| load_prefs_from(&path))
        .unwrap_or_default()
}

pub fn save_prefs(prefs: &UiPrefs) {
    if let Some(path) = prefs_path() {
        let _ = save_prefs_to(&path, prefs);
    }
}

pub fn load_prefs_from(path: &Path) -> Option<UiPrefs> {
    let raw = fs::read_to_string(path).ok()?;
    let prefs = serde_json::from_str::<UiPrefs>(&raw).ok()?;
    if prefs.version != PREFS_VERSION {
        return None;
    }
    Some(prefs)
}

pub fn save_prefs_to(path: &Path, prefs: &UiPrefs) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut prefs = prefs.clone();
    prefs.version = PREFS_VERSION;
    let json = serde_json::to_string_pretty(&prefs)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}

fn prefs_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(PREFS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefs_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui.json");
        let prefs = UiPrefs {
            version: 0,
            section: Some("Summary".to_string()),
            scout_name: Some("Andrés Barrero".to_string()),
            competition: Some("LaLiga".to_string()),
        };
        save_prefs_to(&path, &prefs).unwrap();
        let loaded = load_prefs_from(&path).unwrap();
        assert_eq!(loaded.version, PREFS_VERSION);
        assert_eq!(loaded.scout_name, prefs.scout_name);
        assert_eq!(loaded.competition, prefs.competition);
    }

    #[test]
    fn stale_version_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui.json");
        fs::write(&path, r#"{"version": 99, "scout_name": "x"}"#).unwrap();
        assert!(load_prefs_from(&path).is_none());
    }
}
