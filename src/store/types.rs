//! Content record types as stored on disk.

use crate::utils::now_iso;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field names owned by [`ContentItem`]; never kept in the `extra` payload.
const RESERVED_FIELDS: [&str; 9] = [
    "id",
    "title",
    "caption",
    "status",
    "platforms",
    "createdAt",
    "updatedAt",
    "scheduledAt",
    "publishedAt",
];

/// A string that names no known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Publication status of a content record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
    Failed,
}

impl ContentStatus {
    pub const ALL: [ContentStatus; 4] = [
        ContentStatus::Draft,
        ContentStatus::Scheduled,
        ContentStatus::Published,
        ContentStatus::Failed,
    ];

    /// On-disk name, also used in index keys
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Scheduled => "scheduled",
            ContentStatus::Published => "published",
            ContentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ContentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// A publishing target a record is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Facebook,
    Twitter,
    Linkedin,
    Youtube,
    Threads,
    Pinterest,
}

impl Platform {
    pub const ALL: [Platform; 8] = [
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Facebook,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Youtube,
        Platform::Threads,
        Platform::Pinterest,
    ];

    /// On-disk name, also used in index keys
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Youtube => "youtube",
            Platform::Threads => "threads",
            Platform::Pinterest => "pinterest",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|platform| platform.as_str() == lowered)
            .ok_or_else(|| UnknownVariant {
                kind: "platform",
                value: s.to_string(),
            })
    }
}

/// A stored content record.
///
/// Timestamps are ISO-8601 strings and are compared as strings; fields the
/// store does not know about survive a read/write cycle in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentItem {
    /// Create a record stamped with the current time
    #[must_use]
    pub fn new(id: impl Into<String>, status: ContentStatus) -> Self {
        let now = now_iso();
        Self {
            id: id.into(),
            title: String::new(),
            caption: String::new(),
            status,
            platforms: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            scheduled_at: None,
            published_at: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    #[must_use]
    pub fn with_platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.platforms = platforms.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    #[must_use]
    pub fn with_scheduled_at(mut self, scheduled_at: impl Into<String>) -> Self {
        self.scheduled_at = Some(scheduled_at.into());
        self
    }

    #[must_use]
    pub fn has_platform(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    /// Collapse repeated platform tags (first occurrence wins) and drop extra
    /// keys that would shadow a typed field when serialized.
    pub fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.platforms.retain(|platform| seen.insert(*platform));
        self.extra
            .retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
    }
}

/// Input for creating a record.
#[derive(Debug, Clone, Default)]
pub struct NewContent {
    /// Explicit ID; a UUID v4 is generated when absent
    pub id: Option<String>,
    pub title: String,
    pub caption: String,
    /// Defaults to draft
    pub status: Option<ContentStatus>,
    pub platforms: Vec<Platform>,
    pub scheduled_at: Option<String>,
    pub extra: Map<String, Value>,
}

/// Partial update of a record. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub status: Option<ContentStatus>,
    pub platforms: Option<Vec<Platform>>,
    /// `Some(None)` clears the schedule
    pub scheduled_at: Option<Option<String>>,
    /// Merged into the payload, overwriting existing keys
    pub extra: Map<String, Value>,
}

impl ContentPatch {
    /// Patch that only changes the status
    #[must_use]
    pub fn status(status: ContentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply onto `item`, stamping `updatedAt` with `now`.
    ///
    /// Entering `published` from another status stamps `publishedAt`.
    pub fn apply_to(self, item: &mut ContentItem, now: &str) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(caption) = self.caption {
            item.caption = caption;
        }
        if let Some(status) = self.status {
            if status == ContentStatus::Published && item.status != ContentStatus::Published {
                item.published_at = Some(now.to_string());
            }
            item.status = status;
        }
        if let Some(platforms) = self.platforms {
            item.platforms = platforms;
        }
        if let Some(scheduled_at) = self.scheduled_at {
            item.scheduled_at = scheduled_at;
        }
        item.extra.extend(self.extra);
        item.updated_at = now.to_string();
        item.normalize();
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
