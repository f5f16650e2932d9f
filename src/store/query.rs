//! Filtered reads and counts.

use super::crud::parse_item;
use super::types::{ContentItem, ContentStatus, Platform};
use super::{ContentStore, StoreError};
use crate::kv::KvStore;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, warn};

/// Filters for [`ContentStore::get_filtered`]. Every set filter must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilters {
    /// Served from the status index
    pub status: Option<ContentStatus>,
    /// Served from the platform index
    pub platform: Option<Platform>,
    /// Case-insensitive substring of title or caption
    pub search: Option<String>,
    /// Inclusive lower bound on `createdAt`
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `createdAt`
    pub created_to: Option<DateTime<Utc>>,
}

impl ContentFilters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn created_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    /// Check the predicates no index answers: text search and the date range.
    #[must_use]
    pub fn matches_residual(&self, item: &ContentItem) -> bool {
        self.matches_search(item) && self.matches_created(item)
    }

    fn matches_search(&self, item: &ContentItem) -> bool {
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let needle = search.trim().to_lowercase();
        needle.is_empty()
            || item.title.to_lowercase().contains(&needle)
            || item.caption.to_lowercase().contains(&needle)
    }

    fn matches_created(&self, item: &ContentItem) -> bool {
        if self.created_from.is_none() && self.created_to.is_none() {
            return true;
        }
        let Ok(created) = DateTime::parse_from_rfc3339(&item.created_at) else {
            return false;
        };
        let created = created.with_timezone(&Utc);
        !matches!(self.created_from, Some(from) if created < from)
            && !matches!(self.created_to, Some(to) if created > to)
    }
}

/// Parse a date-range bound: RFC 3339, or a bare `YYYY-MM-DD` date.
///
/// A bare date expands to the start of the day, or to its last millisecond
/// when `end_of_day` is set, so both bounds stay inclusive.
#[must_use]
pub fn parse_date_bound(value: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    Some(date.and_time(time).and_utc())
}

/// Fields results can be ordered by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    ScheduledAt,
    PublishedAt,
    Title,
    Status,
    /// A string field of the extra payload
    Custom(String),
}

impl FromStr for SortField {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "createdat" | "created" => SortField::CreatedAt,
            "updatedat" | "updated" => SortField::UpdatedAt,
            "scheduledat" | "scheduled" => SortField::ScheduledAt,
            "publishedat" | "published" => SortField::PublishedAt,
            "title" => SortField::Title,
            "status" => SortField::Status,
            _ => SortField::Custom(s.to_string()),
        })
    }
}

impl SortField {
    /// Comparison key; missing values sort as the empty string.
    fn key<'a>(&self, item: &'a ContentItem) -> &'a str {
        match self {
            SortField::CreatedAt => &item.created_at,
            SortField::UpdatedAt => &item.updated_at,
            SortField::ScheduledAt => item.scheduled_at.as_deref().unwrap_or(""),
            SortField::PublishedAt => item.published_at.as_deref().unwrap_or(""),
            SortField::Title => &item.title,
            SortField::Status => item.status.as_str(),
            SortField::Custom(name) => item.extra.get(name).and_then(Value::as_str).unwrap_or(""),
        }
    }
}

/// Sorting options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptions {
    pub field: SortField,
    /// Sort descending (default is ascending)
    pub descending: bool,
}

impl SortOptions {
    #[must_use]
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    #[must_use]
    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// Stable sort by plain string comparison of the field.
    ///
    /// Only correct for timestamps because the store writes them as
    /// fixed-shape ISO-8601 UTC strings.
    pub fn apply(&self, items: &mut [ContentItem]) {
        items.sort_by(|a, b| {
            let ordering = self.field.key(a).cmp(self.field.key(b));
            if self.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

/// Record counts read straight from the index lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    pub total: usize,
    pub draft: usize,
    pub scheduled: usize,
    pub published: usize,
    pub failed: usize,
}

impl ContentStats {
    #[must_use]
    pub fn count(&self, status: ContentStatus) -> usize {
        match status {
            ContentStatus::Draft => self.draft,
            ContentStatus::Scheduled => self.scheduled,
            ContentStatus::Published => self.published,
            ContentStatus::Failed => self.failed,
        }
    }
}

fn intersect(candidates: Vec<String>, other: &[String]) -> Vec<String> {
    let allowed: HashSet<&str> = other.iter().map(String::as_str).collect();
    candidates
        .into_iter()
        .filter(|id| allowed.contains(id.as_str()))
        .collect()
}

impl<K: KvStore> ContentStore<K> {
    /// Records matching every filter, optionally sorted.
    ///
    /// Status and platform filters are answered by their index lists
    /// (intersected when both are set); without either, the whole global
    /// list is scanned. Search and date range are checked per record.
    pub async fn get_filtered(
        &self,
        filters: &ContentFilters,
        sort: Option<&SortOptions>,
    ) -> Vec<ContentItem> {
        let ids = self.candidate_ids(filters).await;
        let mut items = match self.fetch_items(&ids).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to fetch content items");
                Vec::new()
            }
        };
        items.retain(|item| filters.matches_residual(item));
        if let Some(sort) = sort {
            sort.apply(&mut items);
        }
        debug!(
            candidates = ids.len(),
            matched = items.len(),
            "Filtered content query"
        );
        items
    }

    /// Candidate IDs from the indexes, in one batched read.
    ///
    /// The global list is always part of the read so a legacy snapshot gets
    /// migrated before any index is trusted.
    async fn candidate_ids(&self, filters: &ContentFilters) -> Vec<String> {
        let mut keys = vec![self.keys.global().to_string()];
        keys.extend(filters.status.map(|status| self.keys.status(status)));
        keys.extend(filters.platform.map(|platform| self.keys.platform(platform)));

        let mut lists = self.read_lists(&keys).await.into_iter();
        let global = lists.next().unwrap_or_default();
        let Some(seed) = lists.next() else {
            return global;
        };
        lists.fold(seed, |candidates, other| intersect(candidates, &other))
    }

    /// Fetch records in one batched read, in `ids` order. IDs without a
    /// readable record are skipped.
    pub(super) async fn fetch_items(&self, ids: &[String]) -> Result<Vec<ContentItem>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let item_keys: Vec<String> = ids.iter().map(|id| self.keys.item(id)).collect();
        let raw = self.kv.multi_get(&item_keys).await?;
        Ok(item_keys
            .iter()
            .zip(raw)
            .filter_map(|(key, value)| value.and_then(|json| parse_item(key, &json)))
            .collect())
    }

    /// Every record, newest first.
    pub async fn get_all(&self) -> Vec<ContentItem> {
        self.get_filtered(&ContentFilters::new(), None).await
    }

    pub async fn get_by_status(&self, status: ContentStatus) -> Vec<ContentItem> {
        self.get_filtered(&ContentFilters::new().with_status(status), None)
            .await
    }

    pub async fn get_by_platform(&self, platform: Platform) -> Vec<ContentItem> {
        self.get_filtered(&ContentFilters::new().with_platform(platform), None)
            .await
    }

    /// Scheduled records, soonest first.
    pub async fn get_scheduled(&self) -> Vec<ContentItem> {
        self.get_filtered(
            &ContentFilters::new().with_status(ContentStatus::Scheduled),
            Some(&SortOptions::ascending(SortField::ScheduledAt)),
        )
        .await
    }

    pub async fn get_drafts(&self) -> Vec<ContentItem> {
        self.get_by_status(ContentStatus::Draft).await
    }

    /// The most recently updated draft.
    pub async fn get_latest_draft(&self) -> Option<ContentItem> {
        self.get_filtered(
            &ContentFilters::new().with_status(ContentStatus::Draft),
            Some(&SortOptions::descending(SortField::UpdatedAt)),
        )
        .await
        .into_iter()
        .next()
    }

    /// Total and per-status counts from one batched read of the lists,
    /// without loading any record.
    pub async fn get_stats(&self) -> ContentStats {
        let mut keys = vec![self.keys.global().to_string()];
        keys.extend(self.keys.all_statuses());
        let lists = self.read_lists(&keys).await;
        let mut lens = lists.iter().map(Vec::len);
        ContentStats {
            total: lens.next().unwrap_or_default(),
            draft: lens.next().unwrap_or_default(),
            scheduled: lens.next().unwrap_or_default(),
            published: lens.next().unwrap_or_default(),
            failed: lens.next().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod query_tests;
