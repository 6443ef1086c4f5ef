//! Configuration surface
//!
//! The only tunable that affects retention is the maximum number of stored
//! events. A data directory enables the JSONL durable mirror.

use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::ConfigError;

/// Default number of retained events
pub const DEFAULT_MAX_STORED_EVENTS: usize = 1000;

/// Environment variable overriding the retained event count
pub const MAX_EVENTS_ENV: &str = "TASK_INSIGHT_MAX_EVENTS";

/// Environment variable naming the mirror directory
pub const DATA_DIR_ENV: &str = "TASK_INSIGHT_DATA_DIR";

/// Configuration for the EventStore
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Maximum number of events kept in memory and in the mirror
    pub max_stored_events: usize,
    /// Directory holding the mirror file; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_stored_events: DEFAULT_MAX_STORED_EVENTS,
            data_dir: None,
        }
    }
}

impl StoreConfig {
    /// In-memory config with a custom retention limit
    pub fn new(max_stored_events: usize) -> Self {
        Self {
            max_stored_events,
            data_dir: None,
        }
    }

    /// Set the mirror directory
    pub fn with_data_dir<P: AsRef<Path>>(mut self, data_dir: P) -> Self {
        self.data_dir = Some(data_dir.as_ref().to_path_buf());
        self
    }

    /// Build config from `TASK_INSIGHT_MAX_EVENTS` / `TASK_INSIGHT_DATA_DIR`
    ///
    /// Invalid values are logged and replaced by the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var(MAX_EVENTS_ENV) {
            match parse_max_events(&raw) {
                Ok(max) => config.max_stored_events = max,
                Err(e) => warn!(error = %e, "ignoring {}", MAX_EVENTS_ENV),
            }
        }

        if let Ok(dir) = env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                let path = PathBuf::from(dir);
                let path = if path.is_absolute() {
                    path
                } else {
                    env::current_dir()
                        .unwrap_or_else(|_| PathBuf::from("."))
                        .join(path)
                };
                config.data_dir = Some(path);
            }
        }

        config
    }

    /// Check that the config describes a usable store
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stored_events == 0 {
            return Err(ConfigError::InvalidMaxEvents("0".to_string()));
        }
        Ok(())
    }

    /// Path to the mirror file, if a data directory is configured
    pub fn events_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("events.jsonl"))
    }
}

/// Parse a positive retention limit
pub fn parse_max_events(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidMaxEvents(raw.to_string())),
    }
}
