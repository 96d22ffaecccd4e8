//! Application configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use tallybar_fetch::FileCredentials;

/// Floor for the poll interval; anything lower hammers the endpoint for
/// data that changes slowly.
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Path to the Claude Code credentials file; auto-detected when unset.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

fn default_poll_interval() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            credentials_path: None,
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tallybar")
            .join("config.json")
    }

    /// Loads configuration from a specific path, falling back to defaults
    /// when the file does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Poll interval with the floor applied.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(MIN_POLL_INTERVAL_SECS))
    }

    /// Credentials file path, configured or auto-detected.
    pub fn credentials_path(&self) -> Option<PathBuf> {
        self.credentials_path
            .clone()
            .or_else(FileCredentials::default_path)
    }
}

// ============================================================================
// Tests
// ============================================================================
