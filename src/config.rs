use crate::error::ScrobblerError;
use crate::orchestrator::PollSettings;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "release-scrobbler";

/// Settings for the scrobbler, loaded from
/// `~/.config/release-scrobbler/config.json` and environment variables.
///
/// Every field has a default, so a missing config file is not an error.
///
/// | Variable | Field |
/// |---|---|
/// | `RELEASE_SCROBBLER_DATA_DIR` | `data_dir` |
/// | `RELEASE_SCROBBLER_POLL_INTERVAL_MS` | `poll_interval_ms` |
/// | `RELEASE_SCROBBLER_INITIAL_POLL_DELAY_MS` | `initial_poll_delay_ms` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrobblerConfig {
    /// Directory holding `releases/<id>.json` and `history.json`
    pub data_dir: PathBuf,
    pub poll_interval_ms: u64,
    pub initial_poll_delay_ms: u64,
    /// Catalog artist name -> tracking service artist name
    pub artist_mappings: HashMap<String, String>,
}

impl Default for ScrobblerConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(APP_DIR));
        Self {
            data_dir,
            poll_interval_ms: 1000,
            initial_poll_delay_ms: 500,
            artist_mappings: HashMap::new(),
        }
    }
}

impl ScrobblerConfig {
    /// Default location of the config file, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    /// Load from the default path, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ScrobblerError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = serde_json::from_str(&contents).map_err(|e| {
            ScrobblerError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Override fields from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("RELEASE_SCROBBLER_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = lookup("RELEASE_SCROBBLER_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_millis("RELEASE_SCROBBLER_POLL_INTERVAL_MS", &ms)?;
        }
        if let Some(ms) = lookup("RELEASE_SCROBBLER_INITIAL_POLL_DELAY_MS") {
            self.initial_poll_delay_ms =
                parse_millis("RELEASE_SCROBBLER_INITIAL_POLL_DELAY_MS", &ms)?;
        }
        Ok(())
    }

    pub fn polling(&self) -> PollSettings {
        PollSettings {
            initial_delay: Duration::from_millis(self.initial_poll_delay_ms),
            interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            ScrobblerError::Config(format!(
                "{key} must be a number of milliseconds, got {value:?}"
            ))
        })
}
