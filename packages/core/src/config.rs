//! Store configuration
//!
//! `StoreConfig` tells the database layer where the libsql file lives and how
//! long a connection waits on a locked database. It is built once at startup,
//! either from defaults or from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the database file path
pub const DB_PATH_ENV: &str = "FOLDSPACE_DB_PATH";

/// Environment variable overriding the busy timeout (milliseconds)
pub const BUSY_TIMEOUT_ENV: &str = "FOLDSPACE_BUSY_TIMEOUT_MS";

/// Busy timeout applied when none is configured
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Database location and connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Path to the libsql database file
    pub database_path: PathBuf,

    /// How long a statement waits for a competing writer before failing
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

impl StoreConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Build config from `FOLDSPACE_DB_PATH` / `FOLDSPACE_BUSY_TIMEOUT_MS`,
    /// falling back to defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        match lookup(BUSY_TIMEOUT_ENV).map(|raw| raw.parse::<u64>()) {
            Some(Ok(ms)) => config.busy_timeout = Duration::from_millis(ms),
            Some(Err(e)) => {
                tracing::warn!(
                    "Ignoring invalid {} value ({}), using {}ms",
                    BUSY_TIMEOUT_ENV,
                    e,
                    DEFAULT_BUSY_TIMEOUT_MS
                );
            }
            None => {}
        }

        config
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

/// `~/.foldspace/database/foldspace.db`, or a relative path when no home
/// directory can be resolved.
pub fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".foldspace").join("database"))
        .unwrap_or_else(|| PathBuf::from(".foldspace"))
        .join("foldspace.db")
}
