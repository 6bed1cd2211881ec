//! Environment-driven runtime configuration.
//!
//! Variables:
//! - `ZEL_DB_PATH`: SQLite file backing the key-value store.
//! - `ZEL_LOG_LEVEL`: `trace|debug|info|warn|error`.
//! - `ZEL_LOG_DIR`: absolute log directory; logging stays off when unset.
//!
//! Blank values count as unset.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "ZEL_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "ZEL_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "ZEL_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "zel_store.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: non_blank(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: non_blank(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}
