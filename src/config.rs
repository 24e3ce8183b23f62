use std::fmt;
use std::path::PathBuf;

use crate::error::ScoutError;

pub const APP_DIR: &str = "scout_terminal";
pub const DEFAULT_FOOTBALL_API_BASE: &str = "https://api.football-data.org/v4";

const DEV_DB_FILE: &str = "dev.sqlite";
const PROD_DB_FILE: &str = "prod.sqlite";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Some(Self::Dev),
            "prod" | "production" => Some(Self::Prod),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Clone, PartialEq, Eq)]
pub struct FootballApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

// Keep the key out of debug output.
impl fmt::Debug for FootballApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FootballApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub dev: DbConfig,
    pub prod: DbConfig,
    pub active: Environment,
    pub football: FootballApiConfig,
}

impl AppConfig {
    /// Reads the process environment. Call [`load_env`] first so `.env` files are honoured.
    pub fn from_env() -> Result<Self, ScoutError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ScoutError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let active = match non_empty("SCOUT_ENV") {
            Some(raw) => Environment::parse(&raw).ok_or_else(|| {
                ScoutError::Config(format!("SCOUT_ENV must be dev or prod, got {raw:?}"))
            })?,
            None => Environment::Dev,
        };

        let data_dir = app_data_dir();
        let db_path = |key: &str, file: &str| -> Result<PathBuf, ScoutError> {
            if let Some(raw) = non_empty(key) {
                return Ok(PathBuf::from(raw.trim()));
            }
            data_dir
                .as_ref()
                .map(|dir| dir.join(file))
                .ok_or_else(|| ScoutError::Config(format!("{key} is unset and no data dir found")))
        };

        Ok(Self {
            dev: DbConfig {
                path: db_path("SCOUT_DEV_DB", DEV_DB_FILE)?,
            },
            prod: DbConfig {
                path: db_path("SCOUT_PROD_DB", PROD_DB_FILE)?,
            },
            active,
            football: FootballApiConfig {
                base_url: non_empty("FOOTBALL_API_BASE")
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_FOOTBALL_API_BASE.to_string()),
                api_key: non_empty("FOOTBALL_API_KEY").map(|v| v.trim().to_string()),
            },
        })
    }

    pub fn db(&self, env: Environment) -> &DbConfig {
        match env {
            Environment::Dev => &self.dev,
            Environment::Prod => &self.prod,
        }
    }

    pub fn active_db(&self) -> &DbConfig {
        self.db(self.active)
    }
}

pub fn load_env() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR),
    )
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_paths_and_key_are_used() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("SCOUT_ENV", "prod"),
            ("SCOUT_DEV_DB", "/tmp/a.sqlite"),
            ("SCOUT_PROD_DB", "/tmp/b.sqlite"),
            ("FOOTBALL_API_KEY", " abc "),
            ("FOOTBALL_API_BASE", "http://localhost:9999/"),
        ]))
        .unwrap();
        assert_eq!(cfg.active, Environment::Prod);
        assert_eq!(cfg.active_db().path, PathBuf::from("/tmp/b.sqlite"));
        assert_eq!(cfg.db(Environment::Dev).path, PathBuf::from("/tmp/a.sqlite"));
        assert_eq!(cfg.football.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.football.base_url, "http://localhost:9999");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("SCOUT_DEV_DB", "/tmp/a.sqlite"),
            ("SCOUT_PROD_DB", "/tmp/b.sqlite"),
            ("FOOTBALL_API_KEY", "   "),
        ]))
        .unwrap();
        assert_eq!(cfg.active, Environment::Dev);
        assert!(cfg.football.api_key.is_none());
        assert_eq!(cfg.football.base_url, DEFAULT_FOOTBALL_API_BASE);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("SCOUT_ENV", "staging"),
            ("SCOUT_DEV_DB", "/tmp/a.sqlite"),
            ("SCOUT_PROD_DB", "/tmp/b.sqlite"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ScoutError::Config(_)));
    }

    #[test]
    fn debug_hides_api_key() {
        let cfg = FootballApiConfig {
            base_url: DEFAULT_FOOTBALL_API_BASE.to_string(),
            api_key: Some("secret".to_string()),
        };
        assert!(!format!("{cfg:?}").contains("secret"));
    }
}
