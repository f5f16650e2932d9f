//! One-shot upgrade of the legacy monolithic snapshot.
//!
//! Before indexing existed, every record was stored as one JSON array of full
//! objects under the global key. The stored shape itself tells the two layouts
//! apart, so the upgrade is idempotent: once the global key holds IDs, there is
//! nothing left to convert.

use super::index::derive_lists;
use super::keys::KeyLayout;
use super::types::ContentItem;
use super::{ContentStore, StoreError};
use crate::kv::KvStore;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::MutexGuard;
use tracing::{info, warn};

/// What a list key can hold on disk.
///
/// An empty array reads as an empty ID list. Legacy entries stay raw JSON so
/// one unreadable record cannot hide the rest of the snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StoredList {
    Ids(Vec<String>),
    Legacy(Vec<Value>),
}

impl StoredList {
    /// Interpret a raw stored value; an absent key is an empty ID list.
    ///
    /// A non-string array counts as a legacy snapshot only when its first
    /// element is an object.
    pub fn parse(raw: Option<&str>) -> Result<Self, serde_json::Error> {
        let Some(raw) = raw else {
            return Ok(StoredList::Ids(Vec::new()));
        };
        let list: Self = serde_json::from_str(raw)?;
        if let StoredList::Legacy(entries) = &list {
            if !entries.first().is_some_and(Value::is_object) {
                return Err(serde::de::Error::custom(
                    "expected an array of ids or of content records",
                ));
            }
        }
        Ok(list)
    }

    #[must_use]
    pub fn is_legacy(&self) -> bool {
        matches!(self, StoredList::Legacy(_))
    }
}

/// The indexed layout derived from a legacy snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Converted IDs in snapshot order
    pub ids: Vec<String>,
    /// Every record, then every status and platform list, then the global list
    pub writes: Vec<(String, String)>,
}

impl MigrationPlan {
    /// Decode each snapshot entry on its own. Entries that do not decode are
    /// logged and left out; duplicate IDs keep their first occurrence.
    pub fn from_snapshot(keys: &KeyLayout, entries: &[Value]) -> Result<Self, StoreError> {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let mut item = match ContentItem::deserialize(entry) {
                Ok(item) => item,
                Err(e) => {
                    warn!(position, error = %e, %entry, "Unreadable legacy record; dropping");
                    continue;
                }
            };
            if item.id.trim().is_empty() {
                warn!("Legacy record without an id; dropping");
                continue;
            }
            if !seen.insert(item.id.clone()) {
                continue;
            }
            item.normalize();
            records.push(item);
        }

        let mut writes = Vec::new();
        for item in &records {
            writes.push((keys.item(&item.id), serde_json::to_string(item)?));
        }
        let mut lists = derive_lists(keys, &records)?;
        // Global list last: until it is rewritten the snapshot is still there
        // and a retry starts over.
        lists.rotate_left(1);
        writes.extend(lists);

        let ids = records.into_iter().map(|item| item.id).collect();
        Ok(Self { ids, writes })
    }
}

impl<K: KvStore> ContentStore<K> {
    /// Convert a stored legacy snapshot now.
    ///
    /// Returns how many records were converted, or `None` when the store is
    /// already in the indexed layout.
    pub async fn migrate_legacy(&self) -> Result<Option<usize>, StoreError> {
        let _gate = self.write_gate.lock().await;
        self.upgrade_global_locked().await
    }

    /// Take the write gate for a mutation.
    ///
    /// A legacy snapshot is converted first, so record reads and index diffs
    /// under the gate always see the indexed layout.
    pub(super) async fn write_lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        let gate = self.write_gate.lock().await;
        self.upgrade_global_locked().await?;
        Ok(gate)
    }

    /// Re-read the global key and convert it if it still holds the legacy
    /// shape. Caller holds the write gate.
    pub(super) async fn upgrade_global_locked(&self) -> Result<Option<usize>, StoreError> {
        let global = self.keys.global();
        let raw = self.kv.get(global).await?;
        match StoredList::parse(raw.as_deref()).map_err(|e| StoreError::corrupt(global, e))? {
            StoredList::Ids(_) => Ok(None),
            StoredList::Legacy(entries) => self.apply_migration_locked(&entries).await.map(Some),
        }
    }

    async fn apply_migration_locked(&self, entries: &[Value]) -> Result<usize, StoreError> {
        let snapshot_len = entries.len();
        let plan = MigrationPlan::from_snapshot(&self.keys, entries)?;
        let converted = plan.ids.len();
        info!(
            records = snapshot_len,
            converted,
            key = self.keys.global(),
            "Migrating legacy content snapshot to indexed layout"
        );
        self.kv.multi_set(plan.writes).await?;
        Ok(converted)
    }
}
