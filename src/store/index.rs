//! Index lists: the membership primitive, batched working sets, and the read
//! paths shared by queries and mutations.

use super::keys::KeyLayout;
use super::migration::StoredList;
use super::types::{ContentItem, ContentStatus, Platform};
use super::{ContentStore, StoreError};
use crate::kv::KvStore;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::warn;

/// Add `id` to the front of `list`, or remove it.
///
/// Returns whether the list changed; asking for a state that already holds is
/// a no-op, so an ID never appears twice.
pub fn update_list(list: &mut Vec<String>, id: &str, add: bool) -> bool {
    let present = list.iter().any(|entry| entry == id);
    match (add, present) {
        (true, false) => {
            list.insert(0, id.to_string());
            true
        }
        (false, true) => {
            list.retain(|entry| entry != id);
            true
        }
        _ => false,
    }
}

/// Decode a stored index list. Absent, corrupt, or legacy-shaped values read
/// as empty.
#[must_use]
pub fn parse_id_list(key: &str, raw: Option<&str>) -> Vec<String> {
    match StoredList::parse(raw) {
        Ok(StoredList::Ids(ids)) => ids,
        Ok(StoredList::Legacy(_)) => {
            warn!(key, "Item array stored under an index key; ignoring");
            Vec::new()
        }
        Err(e) => {
            warn!(key, error = %e, "Unreadable index list; treating as empty");
            Vec::new()
        }
    }
}

fn encode_list(ids: &[String]) -> Result<String, StoreError> {
    Ok(serde_json::to_string(ids)?)
}

/// Derive every index list (global, each status, each platform) from `items`.
///
/// Lists follow `items` order; repeated IDs keep their first occurrence. Lists
/// with no members are still emitted so stale values get overwritten. The
/// global list comes first.
pub fn derive_lists(
    keys: &KeyLayout,
    items: &[ContentItem],
) -> Result<Vec<(String, String)>, StoreError> {
    let mut global = Vec::with_capacity(items.len());
    let mut by_status: BTreeMap<ContentStatus, Vec<String>> = ContentStatus::ALL
        .into_iter()
        .map(|status| (status, Vec::new()))
        .collect();
    let mut by_platform: BTreeMap<Platform, Vec<String>> = Platform::ALL
        .into_iter()
        .map(|platform| (platform, Vec::new()))
        .collect();
    let mut seen = HashSet::new();

    for item in items {
        if !seen.insert(item.id.as_str()) {
            continue;
        }
        global.push(item.id.clone());
        by_status
            .entry(item.status)
            .or_default()
            .push(item.id.clone());
        let platforms: BTreeSet<Platform> = item.platforms.iter().copied().collect();
        for platform in platforms {
            by_platform
                .entry(platform)
                .or_default()
                .push(item.id.clone());
        }
    }

    let mut writes = vec![(keys.global().to_string(), encode_list(&global)?)];
    for (status, ids) in by_status {
        writes.push((keys.status(status), encode_list(&ids)?));
    }
    for (platform, ids) in by_platform {
        writes.push((keys.platform(platform), encode_list(&ids)?));
    }
    Ok(writes)
}

/// Index lists loaded for one mutation, tracking which ones changed.
#[derive(Debug, Default)]
pub struct IndexBatch {
    lists: BTreeMap<String, Vec<String>>,
    dirty: BTreeSet<String>,
}

impl IndexBatch {
    #[must_use]
    pub fn from_lists<I>(lists: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            lists: lists.into_iter().collect(),
            dirty: BTreeSet::new(),
        }
    }

    /// Ensure `id` is in the list under `key`.
    pub fn add(&mut self, key: &str, id: &str) -> bool {
        self.update(key, id, true)
    }

    /// Ensure `id` is not in the list under `key`.
    pub fn remove(&mut self, key: &str, id: &str) -> bool {
        self.update(key, id, false)
    }

    fn update(&mut self, key: &str, id: &str, add: bool) -> bool {
        let list = self.lists.entry(key.to_string()).or_default();
        let changed = update_list(list, id, add);
        if changed {
            self.dirty.insert(key.to_string());
        }
        changed
    }

    /// Drop every ID in `ids` from the list under `key`, keeping the order of
    /// the rest.
    pub fn remove_all(&mut self, key: &str, ids: &HashSet<&str>) -> bool {
        let Some(list) = self.lists.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|id| !ids.contains(id.as_str()));
        let changed = list.len() != before;
        if changed {
            self.dirty.insert(key.to_string());
        }
        changed
    }

    /// Current contents of the list under `key`.
    #[must_use]
    pub fn list(&self, key: &str) -> &[String] {
        self.lists.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Keys whose lists changed since loading, in key order.
    #[must_use]
    pub fn changed_keys(&self) -> Vec<&str> {
        self.dirty.iter().map(String::as_str).collect()
    }

    /// Encoded `(key, value)` pairs for the lists that changed.
    pub fn into_writes(self) -> Result<Vec<(String, String)>, StoreError> {
        let Self { lists, dirty } = self;
        lists
            .into_iter()
            .filter(|(key, _)| dirty.contains(key))
            .map(|(key, ids)| encode_list(&ids).map(|value| (key, value)))
            .collect()
    }
}

impl<K: KvStore> ContentStore<K> {
    /// Current IDs under `index_key`, newest first.
    ///
    /// Reading the global list upgrades a legacy snapshot in place. Failures
    /// are logged and read as an empty list.
    pub async fn get_ids(&self, index_key: &str) -> Vec<String> {
        if index_key == self.keys.global() {
            let keys = [index_key.to_string()];
            return self
                .read_lists(&keys)
                .await
                .into_iter()
                .next()
                .unwrap_or_default();
        }
        match self.kv.get(index_key).await {
            Ok(raw) => parse_id_list(index_key, raw.as_deref()),
            Err(e) => {
                warn!(key = index_key, error = %e, "Failed to read index list");
                Vec::new()
            }
        }
    }

    /// One batched read of several lists, in `keys` order.
    ///
    /// If `keys` includes the global list and it still holds a legacy
    /// snapshot, the snapshot is migrated first. Failures read as empty lists.
    pub(super) async fn read_lists(&self, keys: &[String]) -> Vec<Vec<String>> {
        match self.multi_get_upgraded(keys).await {
            Ok(raw) => keys
                .iter()
                .zip(raw)
                .map(|(key, value)| parse_id_list(key, value.as_deref()))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to read index lists");
                keys.iter().map(|_| Vec::new()).collect()
            }
        }
    }

    /// One batched read of the lists a mutation touches. Caller holds the
    /// write gate and has already converted any legacy snapshot.
    ///
    /// Unlike [`Self::read_lists`], substrate failures propagate, and so does a
    /// corrupt global list: rewriting it from an empty base would orphan every
    /// record. Other corrupt lists are rebuilt from empty.
    pub(super) async fn load_batch_locked(
        &self,
        keys: &[String],
    ) -> Result<IndexBatch, StoreError> {
        let raw = self.kv.multi_get(keys).await?;
        let global = self.keys.global();
        let mut lists = Vec::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(raw) {
            let ids = if key == global {
                match StoredList::parse(value.as_deref()) {
                    Ok(StoredList::Ids(ids)) => ids,
                    Ok(StoredList::Legacy(_)) => {
                        return Err(StoreError::corrupt(
                            key.as_str(),
                            "legacy snapshot still present after migration",
                        ))
                    }
                    Err(e) => return Err(StoreError::corrupt(key.as_str(), e)),
                }
            } else {
                parse_id_list(key, value.as_deref())
            };
            lists.push((key.clone(), ids));
        }
        Ok(IndexBatch::from_lists(lists))
    }

    async fn multi_get_upgraded(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        let raw = self.kv.multi_get(keys).await?;
        if !self.holds_legacy_snapshot(keys, &raw) {
            return Ok(raw);
        }
        // Another reader may have migrated while we waited; re-check under
        // the gate.
        {
            let _gate = self.write_gate.lock().await;
            self.upgrade_global_locked().await?;
        }
        Ok(self.kv.multi_get(keys).await?)
    }

    fn holds_legacy_snapshot(&self, keys: &[String], raw: &[Option<String>]) -> bool {
        let Some(position) = keys.iter().position(|key| key == self.keys.global()) else {
            return false;
        };
        raw.get(position)
            .and_then(Option::as_deref)
            .and_then(|value| StoredList::parse(Some(value)).ok())
            .is_some_and(|list| list.is_legacy())
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod index_tests;
