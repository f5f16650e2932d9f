//! Indexed content store layered over a [`KvStore`].
//!
//! Records live one per key; derived ID lists (a global list, one per status,
//! one per platform) let filtered reads skip a full scan. Every mutation is a
//! planned batch: one `multi_get` of the affected lists, an in-memory diff, and
//! one `multi_set` of the lists that changed plus the record.
//!
//! Mutations run one at a time per store instance behind a write gate. Reads
//! are not gated and never fail: unreadable values log a warning and read as
//! absent, since every list can be rebuilt from the records.

mod batch;
mod crud;
mod error;
mod index;
mod keys;
mod migration;
mod query;
mod types;

pub use batch::{RebuildReport, SavePlan};
pub use error::StoreError;
pub use index::{derive_lists, update_list, IndexBatch};
pub use keys::{KeyLayout, DEFAULT_KEY_PREFIX};
pub use migration::{MigrationPlan, StoredList};
pub use query::{parse_date_bound, ContentFilters, ContentStats, SortField, SortOptions};
pub use types::{ContentItem, ContentPatch, ContentStatus, NewContent, Platform, UnknownVariant};

use crate::kv::KvStore;
use tokio::sync::Mutex;

/// Store settings that affect the on-disk layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Prefix for every key this store reads or writes
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

/// An indexed object store for content records.
///
/// Construct one per substrate and share it by reference; the write gate only
/// serializes mutations issued through the same instance.
pub struct ContentStore<K> {
    kv: K,
    keys: KeyLayout,
    write_gate: Mutex<()>,
}

impl<K: KvStore> ContentStore<K> {
    /// Create a store using the default key prefix.
    #[must_use]
    pub fn new(kv: K) -> Self {
        Self::with_config(kv, &StoreConfig::default())
    }

    #[must_use]
    pub fn with_config(kv: K, config: &StoreConfig) -> Self {
        Self {
            kv,
            keys: KeyLayout::new(config.key_prefix.clone()),
            write_gate: Mutex::new(()),
        }
    }

    /// Key layout this store reads and writes
    #[must_use]
    pub fn keys(&self) -> &KeyLayout {
        &self.keys
    }

    /// The underlying substrate
    #[must_use]
    pub fn kv(&self) -> &K {
        &self.kv
    }
}
