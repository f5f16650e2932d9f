//! Storage key layout.
//!
//! These shapes are the on-disk contract shared with existing data:
//!
//! - `<prefix>`: global ID list (or the legacy item array)
//! - `<prefix>_idx_status_<status>`
//! - `<prefix>_idx_platform_<platform>`
//! - `<prefix>_item_<id>`

use super::types::{ContentStatus, Platform};

/// Prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "content";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl KeyLayout {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of the global ID list.
    #[must_use]
    pub fn global(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn status(&self, status: ContentStatus) -> String {
        format!("{}_idx_status_{}", self.prefix, status.as_str())
    }

    #[must_use]
    pub fn platform(&self, platform: Platform) -> String {
        format!("{}_idx_platform_{}", self.prefix, platform.as_str())
    }

    #[must_use]
    pub fn item(&self, id: &str) -> String {
        format!("{}_item_{id}", self.prefix)
    }

    /// Every status index key, in [`ContentStatus::ALL`] order.
    #[must_use]
    pub fn all_statuses(&self) -> Vec<String> {
        ContentStatus::ALL.iter().map(|s| self.status(*s)).collect()
    }

    /// Every platform index key, in [`Platform::ALL`] order.
    #[must_use]
    pub fn all_platforms(&self) -> Vec<String> {
        Platform::ALL.iter().map(|p| self.platform(*p)).collect()
    }

    /// Global list followed by every status and platform index key.
    #[must_use]
    pub fn all_indexes(&self) -> Vec<String> {
        let mut keys = vec![self.global().to_string()];
        keys.extend(self.all_statuses());
        keys.extend(self.all_platforms());
        keys
    }
}
