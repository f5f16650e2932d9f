//! Common test utilities

use async_trait::async_trait;
use content_store::store::{ContentItem, ContentStatus, Platform};
use content_store::{KvError, KvStore, MemoryKv};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
#[allow(dead_code)] // Test utility for integration tests
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// In-memory substrate that records every write batch it receives.
#[allow(dead_code)] // Test utility for integration tests
#[derive(Debug, Default)]
pub struct RecordingKv {
    inner: MemoryKv,
    batches: Mutex<Vec<Vec<String>>>,
    multi_gets: AtomicUsize,
}

#[allow(dead_code)] // Test utility for integration tests
impl RecordingKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inner: MemoryKv::with_entries(entries),
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &MemoryKv {
        &self.inner
    }

    /// Keys of every write batch so far, one entry per `set`/`multi_set` call
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    /// Every key written so far, in write order
    pub fn written_keys(&self) -> Vec<String> {
        self.batches().into_iter().flatten().collect()
    }

    pub fn multi_get_calls(&self) -> usize {
        self.multi_gets.load(Ordering::SeqCst)
    }

    /// Forget recorded calls, keeping the data
    pub fn reset(&self) {
        self.batches.lock().unwrap().clear();
        self.multi_gets.store(0, Ordering::SeqCst);
    }

    fn record(&self, keys: Vec<String>) {
        self.batches.lock().unwrap().push(keys);
    }
}

#[async_trait]
impl KvStore for RecordingKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        self.record(vec![key.to_string()]);
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        self.inner.remove(key).await
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>, KvError> {
        self.multi_gets.fetch_add(1, Ordering::SeqCst);
        self.inner.multi_get(keys).await
    }

    async fn multi_set(&self, pairs: Vec<(String, String)>) -> Result<(), KvError> {
        self.record(pairs.iter().map(|(key, _)| key.clone()).collect());
        self.inner.multi_set(pairs).await
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<(), KvError> {
        self.inner.multi_remove(keys).await
    }
}

/// A record with fixed timestamps
#[allow(dead_code)] // Test utility for integration tests
pub fn item(id: &str, status: ContentStatus, platforms: &[Platform]) -> ContentItem {
    ContentItem::new(id, status)
        .with_title(format!("Title {id}"))
        .with_platforms(platforms.iter().copied())
        .with_created_at("2024-01-01T00:00:00.000Z")
}

/// Raw legacy snapshot: every record inline under the global key.
#[allow(dead_code)] // Test utility for integration tests
pub fn legacy_snapshot() -> String {
    serde_json::json!([
        {
            "id": "post-3",
            "title": "Summer sale",
            "caption": "Everything must go",
            "status": "scheduled",
            "platforms": ["instagram", "facebook"],
            "createdAt": "2024-03-01T09:00:00.000Z",
            "updatedAt": "2024-03-02T09:00:00.000Z",
            "scheduledAt": "2024-06-01T12:00:00.000Z",
            "campaign": "summer"
        },
        {
            "id": "post-2",
            "title": "Launch recap",
            "caption": "",
            "status": "published",
            "platforms": ["youtube"],
            "createdAt": "2024-02-01T09:00:00.000Z",
            "updatedAt": "2024-02-03T09:00:00.000Z",
            "publishedAt": "2024-02-03T09:00:00.000Z"
        },
        {
            "id": "post-1",
            "title": "First draft",
            "caption": "wip",
            "status": "draft",
            "platforms": ["instagram"],
            "createdAt": "2024-01-01T09:00:00.000Z",
            "updatedAt": "2024-01-05T09:00:00.000Z"
        }
    ])
    .to_string()
}

/// The records of [`legacy_snapshot`], in snapshot order
#[allow(dead_code)] // Test utility for integration tests
pub fn legacy_items() -> Vec<ContentItem> {
    serde_json::from_str(&legacy_snapshot()).expect("fixture parses")
}
