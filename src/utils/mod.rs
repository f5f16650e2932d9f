mod atomic;

pub use atomic::atomic_write;

use chrono::SecondsFormat;
use std::path::PathBuf;

/// The name of the per-user content-store folder
pub const STORE_HOME_FOLDER: &str = ".content-store";

/// Get the per-user content-store folder (`~/.content-store`).
///
/// Falls back to the current directory when no home directory is known.
#[must_use]
pub fn store_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORE_HOME_FOLDER)
}

/// Get current timestamp in ISO 8601 format, UTC with millisecond precision.
///
/// Every timestamp the store writes has this exact shape so that plain string
/// comparison orders them chronologically.
#[must_use]
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
