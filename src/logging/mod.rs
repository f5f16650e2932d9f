mod init;

pub use init::{init_logging, parse_rotation};

use crate::config::Settings;
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::rolling::Rotation;

/// Log filename used by the CLI.
pub const LOG_FILENAME: &str = "content-store.log";

/// Crate name used as the default filter target.
pub const LOG_TARGET: &str = "content_store";

/// Configuration for the logging system.
pub struct LogConfig {
    pub log_dir: PathBuf,
    /// Default level when `RUST_LOG` is not set
    pub log_level: Level,
    pub json_format: bool,
    pub rotation: Rotation,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), Level::INFO)
    }
}

impl LogConfig {
    /// Logging setup described by `settings`, with `level` already resolved.
    #[must_use]
    pub fn from_settings(settings: &Settings, level: Level) -> Self {
        Self {
            log_dir: settings.log_dir(),
            log_level: level,
            json_format: settings.log.json,
            rotation: parse_rotation(&settings.log.rotation),
        }
    }

    /// Full path of the active log file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILENAME)
    }

    /// Filter directive used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_directive(&self) -> String {
        format!("{LOG_TARGET}={}", self.log_level)
    }
}

#[cfg(test)]
#[path = "../logging_tests.rs"]
mod logging_tests;
