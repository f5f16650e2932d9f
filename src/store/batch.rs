//! Batched mutations.
//!
//! Each mutation works out up front which index lists it touches, reads them in
//! one call, edits them in memory, and writes back only the ones that changed.

use super::index::{derive_lists, IndexBatch};
use super::keys::KeyLayout;
use super::types::ContentItem;
use super::{ContentStore, StoreError};
use crate::kv::KvStore;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Index membership changes for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavePlan {
    add: Vec<String>,
    remove: Vec<String>,
}

impl SavePlan {
    /// Diff `next` against the stored `previous` version.
    ///
    /// The item always joins the global list, its status list and each of its
    /// platform lists; it leaves its old status list if the status changed and
    /// every platform list it no longer carries.
    #[must_use]
    pub fn for_save(keys: &KeyLayout, previous: Option<&ContentItem>, next: &ContentItem) -> Self {
        let mut add = vec![keys.global().to_string(), keys.status(next.status)];
        add.extend(next.platforms.iter().map(|platform| keys.platform(*platform)));

        let mut remove = Vec::new();
        if let Some(prev) = previous {
            if prev.status != next.status {
                remove.push(keys.status(prev.status));
            }
            remove.extend(
                prev.platforms
                    .iter()
                    .filter(|platform| !next.has_platform(**platform))
                    .map(|platform| keys.platform(*platform)),
            );
        }
        Self { add, remove }
    }

    /// Every list `item` belongs to.
    #[must_use]
    pub fn for_delete(keys: &KeyLayout, item: &ContentItem) -> Self {
        let mut remove = vec![keys.global().to_string(), keys.status(item.status)];
        remove.extend(item.platforms.iter().map(|platform| keys.platform(*platform)));
        Self {
            add: Vec::new(),
            remove,
        }
    }

    /// Remove from each of `keys`.
    #[must_use]
    pub fn scrub(keys: Vec<String>) -> Self {
        Self {
            add: Vec::new(),
            remove: keys,
        }
    }

    #[must_use]
    pub fn adds(&self) -> &[String] {
        &self.add
    }

    #[must_use]
    pub fn removes(&self) -> &[String] {
        &self.remove
    }

    /// Lists to load before applying.
    #[must_use]
    pub fn read_keys(&self) -> Vec<String> {
        self.add.iter().chain(&self.remove).cloned().collect()
    }

    pub fn apply(&self, batch: &mut IndexBatch, id: &str) {
        for key in &self.add {
            batch.add(key, id);
        }
        for key in &self.remove {
            batch.remove(key, id);
        }
    }
}

/// Outcome of [`ContentStore::rebuild_indexes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Records now indexed
    pub items: usize,
    /// Global-list entries dropped because no readable record backed them
    pub dangling_removed: usize,
    /// Whether a legacy snapshot was converted first
    pub migrated: bool,
}

pub(super) fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidItem("item id must not be empty".to_string()));
    }
    Ok(())
}

impl<K: KvStore> ContentStore<K> {
    /// Insert or replace a record, moving it between index lists as needed.
    ///
    /// Saving a record whose status and platforms are unchanged rewrites only
    /// the record itself.
    pub async fn save(&self, item: ContentItem) -> Result<ContentItem, StoreError> {
        validate_id(&item.id)?;
        let _gate = self.write_lock().await?;
        let previous = self.load_record(&item.id).await?.item;
        self.persist_locked(item, previous.as_ref()).await
    }

    /// Write `item` and its index diff against `previous` in one batch. Caller
    /// holds the write gate.
    pub(super) async fn persist_locked(
        &self,
        mut item: ContentItem,
        previous: Option<&ContentItem>,
    ) -> Result<ContentItem, StoreError> {
        item.normalize();
        let plan = SavePlan::for_save(&self.keys, previous, &item);
        let mut batch = self.load_batch_locked(&plan.read_keys()).await?;
        plan.apply(&mut batch, &item.id);
        let indexes_changed = batch.changed_keys().len();

        let mut writes = batch.into_writes()?;
        writes.push((self.keys.item(&item.id), serde_json::to_string(&item)?));
        self.kv.multi_set(writes).await?;

        debug!(
            id = %item.id,
            status = %item.status,
            indexes_changed,
            "Saved content item"
        );
        Ok(item)
    }

    /// Delete one record and scrub it from every list it belonged to.
    ///
    /// Lists are rewritten before the record is removed, so an interrupted
    /// delete leaves at worst a dangling ID rather than an unreachable record.
    /// An ID with no record is still dropped from the global list. Returns
    /// whether a record was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _gate = self.write_lock().await?;
        let record = self.load_record(id).await?;
        let plan = match (&record.item, record.exists) {
            (Some(item), _) => SavePlan::for_delete(&self.keys, item),
            // Unreadable record: memberships unknown, scrub every list.
            (None, true) => SavePlan::scrub(self.keys.all_indexes()),
            (None, false) => SavePlan::scrub(vec![self.keys.global().to_string()]),
        };

        let mut batch = self.load_batch_locked(&plan.read_keys()).await?;
        plan.apply(&mut batch, id);
        let writes = batch.into_writes()?;
        let indexes_changed = writes.len();
        if !writes.is_empty() {
            self.kv.multi_set(writes).await?;
        }
        if record.exists {
            self.kv.remove(&self.keys.item(id)).await?;
        }

        debug!(id, existed = record.exists, indexes_changed, "Deleted content item");
        Ok(record.exists)
    }

    /// Delete several records with one read, one write, and one remove.
    ///
    /// Every list is loaded once and filtered in memory; only lists that
    /// shrank are written back, and the remaining IDs keep their order.
    /// Returns how many of `ids` were present in the global list.
    pub async fn delete_many(&self, ids: &[String]) -> Result<usize, StoreError> {
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        if targets.is_empty() {
            return Ok(0);
        }

        let _gate = self.write_lock().await?;
        let index_keys = self.keys.all_indexes();
        let mut batch = self.load_batch_locked(&index_keys).await?;
        let removed = batch
            .list(self.keys.global())
            .iter()
            .filter(|id| targets.contains(id.as_str()))
            .count();
        for key in &index_keys {
            batch.remove_all(key, &targets);
        }

        let writes = batch.into_writes()?;
        let indexes_changed = writes.len();
        if !writes.is_empty() {
            self.kv.multi_set(writes).await?;
        }
        let mut item_keys: Vec<String> = targets.iter().map(|id| self.keys.item(id)).collect();
        item_keys.sort();
        self.kv.multi_remove(&item_keys).await?;

        info!(
            requested = targets.len(),
            removed,
            indexes_changed,
            "Deleted content items"
        );
        Ok(removed)
    }

    /// Recompute every index list from the global list and the records.
    ///
    /// IDs without a readable record are dropped; every status and platform
    /// list is rewritten, including empty ones.
    pub async fn rebuild_indexes(&self) -> Result<RebuildReport, StoreError> {
        let _gate = self.write_gate.lock().await;
        let migrated = self.upgrade_global_locked().await?.is_some();

        let global = [self.keys.global().to_string()];
        let batch = self.load_batch_locked(&global).await?;
        let ids = batch.list(self.keys.global()).to_vec();
        let records = self.fetch_items(&ids).await?;
        let dangling_removed = ids.len().saturating_sub(records.len());

        self.kv.multi_set(derive_lists(&self.keys, &records)?).await?;

        let unique: HashSet<&str> = records.iter().map(|item| item.id.as_str()).collect();
        let report = RebuildReport {
            items: unique.len(),
            dangling_removed,
            migrated,
        };
        info!(
            items = report.items,
            dangling_removed, migrated, "Rebuilt content indexes"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod batch_tests;
