//! Error type for the indexed store.

use crate::kv::KvError;
use thiserror::Error;

/// Unified error type for store operations.
///
/// Only mutations surface these; lookups log and degrade to "absent".
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Kv(#[from] KvError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid item: {0}")]
    InvalidItem(String),
    #[error("Corrupt value under '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    /// Create a not found error
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound(id.into())
    }

    /// Create a corruption error for a storage key
    #[must_use]
    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
