//! Configuration for the external commands and engine timing.
//!
//! Stored in JSON format at `~/.portmanager/config.json`. Every key is
//! optional; a missing file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::adapters::OutputFormat;
use crate::error::{Error, Result};

fn default_command_timeout_ms() -> u64 {
    10_000
}

fn default_rescan_delay_ms() -> u64 {
    500
}

fn default_refresh_interval() -> u64 {
    5
}

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// lsof binary. Searched in the usual locations when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsof_path: Option<PathBuf>,

    /// kill binary. Searched in the usual locations when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_path: Option<PathBuf>,

    /// Output shape requested from lsof.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Upper bound for any single external command, in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Delay between a successful kill and the follow-up scan, in milliseconds.
    #[serde(default = "default_rescan_delay_ms")]
    pub rescan_delay_ms: u64,

    /// Timer-triggered scan interval in seconds, used by watch mode.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lsof_path: None,
            kill_path: None,
            output_format: OutputFormat::default(),
            command_timeout_ms: default_command_timeout_ms(),
            rescan_delay_ms: default_rescan_delay_ms(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Upper bound for any single external command.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Delay between a successful kill and the follow-up scan.
    pub fn rescan_delay(&self) -> Duration {
        Duration::from_millis(self.rescan_delay_ms)
    }

    /// Timer-triggered scan interval.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_ms == 0 {
            return Err(Error::Config(
                "commandTimeoutMs must be greater than zero".to_string(),
            ));
        }
        if self.refresh_interval == 0 {
            return Err(Error::Config(
                "refreshInterval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration store for reading and writing `config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portmanager/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portmanager").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;

        if let Some(config_dir) = self.config_path.parent() {
            fs::create_dir_all(config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}
