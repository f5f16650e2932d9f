//! Settings loaded from `~/.content-store/config.toml`.
//!
//! The file is optional; every field falls back to its default. Command-line
//! flags and `CONTENT_STORE_*` environment variables override what is loaded
//! here.

use crate::store::{StoreConfig, DEFAULT_KEY_PREFIX};
use crate::utils::store_home;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn, Level};

/// Name of the settings file inside the store home folder.
pub const SETTINGS_FILENAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

/// `[store]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    /// Prefix for every storage key
    pub key_prefix: String,
    /// Directory of the file-backed substrate (default: `~/.content-store/data`)
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            data_dir: None,
        }
    }
}

/// `[log]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    /// Default level when `RUST_LOG` is not set
    pub level: String,
    pub json: bool,
    /// `daily`, `hourly`, or `never`
    pub rotation: String,
    /// Log directory (default: `~/.content-store/logs`)
    pub dir: Option<PathBuf>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            rotation: "daily".to_string(),
            dir: None,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub log: LogSection,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.store
            .data_dir
            .clone()
            .unwrap_or_else(|| store_home().join("data"))
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.log
            .dir
            .clone()
            .unwrap_or_else(|| store_home().join("logs"))
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.log.level.trim()).map_err(|_| ConfigError::InvalidValue {
            field: "log.level",
            value: self.log.level.clone(),
        })
    }

    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            key_prefix: self.store.key_prefix.clone(),
        }
    }
}

/// Default location of the settings file (`~/.content-store/config.toml`).
#[must_use]
pub fn default_settings_path() -> PathBuf {
    store_home().join(SETTINGS_FILENAME)
}

/// Load settings from `path`, or from [`default_settings_path`].
///
/// A missing file yields `Settings::default()`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.map_or_else(default_settings_path, Path::to_path_buf);
    if !path.exists() {
        debug!("Settings not found at {}; using defaults", path.display());
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let settings = Settings::from_toml(&content)?;
    if settings.store.key_prefix.trim().is_empty() {
        warn!("Empty store.key_prefix in {}", path.display());
        return Err(ConfigError::InvalidValue {
            field: "store.key_prefix",
            value: settings.store.key_prefix,
        });
    }
    debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
