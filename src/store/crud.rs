//! Record-level operations: lookups, create, update, duplicate.

use super::batch::validate_id;
use super::migration::StoredList;
use super::types::{ContentItem, ContentPatch, ContentStatus, NewContent};
use super::{ContentStore, StoreError};
use crate::kv::KvStore;
use crate::utils::now_iso;
use tracing::{info, warn};
use uuid::Uuid;

/// A record slot as read from the substrate.
#[derive(Debug)]
pub(super) struct StoredRecord {
    /// A value exists under the record key, readable or not
    pub(super) exists: bool,
    pub(super) item: Option<ContentItem>,
}

/// Decode a record, logging and skipping anything unreadable.
pub(super) fn parse_item(key: &str, raw: &str) -> Option<ContentItem> {
    match serde_json::from_str::<ContentItem>(raw) {
        Ok(item) => Some(item),
        Err(e) => {
            warn!(key, error = %e, "Unreadable content record; skipping");
            None
        }
    }
}

impl<K: KvStore> ContentStore<K> {
    pub(super) async fn load_record(&self, id: &str) -> Result<StoredRecord, StoreError> {
        let key = self.keys.item(id);
        let raw = self.kv.get(&key).await?;
        Ok(StoredRecord {
            exists: raw.is_some(),
            item: raw.and_then(|value| parse_item(&key, &value)),
        })
    }

    /// Look up one record. Returns a detached copy; a missing or unreadable
    /// record reads as `None`.
    pub async fn get_by_id(&self, id: &str) -> Option<ContentItem> {
        match self.lookup(id).await {
            Ok(item) => item,
            Err(e) => {
                warn!(id, error = %e, "Failed to read content item");
                None
            }
        }
    }

    async fn lookup(&self, id: &str) -> Result<Option<ContentItem>, StoreError> {
        let record = self.load_record(id).await?;
        if record.exists {
            return Ok(record.item);
        }
        // A miss may be a record that still lives inside a legacy snapshot.
        let raw = self.kv.get(self.keys.global()).await?;
        if !StoredList::parse(raw.as_deref()).is_ok_and(|list| list.is_legacy()) {
            return Ok(None);
        }
        {
            let _gate = self.write_gate.lock().await;
            self.upgrade_global_locked().await?;
        }
        Ok(self.load_record(id).await?.item)
    }

    /// Create a record.
    ///
    /// Without an explicit ID a UUID v4 is generated; an explicit ID that is
    /// already taken is rejected. Status defaults to draft.
    pub async fn create(&self, input: NewContent) -> Result<ContentItem, StoreError> {
        let NewContent {
            id,
            title,
            caption,
            status,
            platforms,
            scheduled_at,
            extra,
        } = input;
        let explicit_id = id.is_some();
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        validate_id(&id)?;

        let mut item = ContentItem::new(id, status.unwrap_or_default())
            .with_title(title)
            .with_caption(caption)
            .with_platforms(platforms);
        item.scheduled_at = scheduled_at;
        item.extra = extra;
        if item.status == ContentStatus::Published {
            item.published_at = Some(item.created_at.clone());
        }

        let _gate = self.write_lock().await?;
        if explicit_id && self.load_record(&item.id).await?.exists {
            return Err(StoreError::AlreadyExists(item.id));
        }
        let created = self.persist_locked(item, None).await?;
        info!(id = %created.id, status = %created.status, "Created content item");
        Ok(created)
    }

    /// Apply a partial update to an existing record.
    pub async fn update(&self, id: &str, patch: ContentPatch) -> Result<ContentItem, StoreError> {
        let _gate = self.write_lock().await?;
        let previous = self
            .load_record(id)
            .await?
            .item
            .ok_or_else(|| StoreError::not_found(id))?;
        let mut next = previous.clone();
        patch.apply_to(&mut next, &now_iso());
        self.persist_locked(next, Some(&previous)).await
    }

    /// Move a record to `status`.
    pub async fn set_status(
        &self,
        id: &str,
        status: ContentStatus,
    ) -> Result<ContentItem, StoreError> {
        self.update(id, ContentPatch::status(status)).await
    }

    /// Copy a record into a new draft with a fresh ID and no schedule.
    pub async fn duplicate(&self, id: &str) -> Result<ContentItem, StoreError> {
        let _gate = self.write_lock().await?;
        let source = self
            .load_record(id)
            .await?
            .item
            .ok_or_else(|| StoreError::not_found(id))?;

        let now = now_iso();
        let copy = ContentItem {
            id: Uuid::new_v4().to_string(),
            title: format!("{} (copy)", source.title),
            status: ContentStatus::Draft,
            created_at: now.clone(),
            updated_at: now,
            scheduled_at: None,
            published_at: None,
            ..source
        };
        let created = self.persist_locked(copy, None).await?;
        info!(source = id, id = %created.id, "Duplicated content item");
        Ok(created)
    }
}
