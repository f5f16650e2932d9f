//! Flat asynchronous key-value substrate.
//!
//! The store layer never interprets anything below this trait: keys are plain
//! strings and values are JSON text. Single-key operations are atomic; nothing
//! is promised across keys, except that `multi_set` writes its last pair only
//! after every earlier pair has been written.

mod file;
mod memory;

pub use file::FileKv;
pub use memory::MemoryKv;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a substrate implementation.
#[derive(Error, Debug)]
pub enum KvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid key '{0}'")]
    InvalidKey(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

impl KvError {
    /// Create a backend error with a message
    pub fn backend(msg: impl Into<String>) -> Self {
        KvError::Backend(msg.into())
    }
}

/// The key-value contract the indexed store is layered on.
///
/// `multi_get` returns one slot per requested key, in request order.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set(&self, key: &str, value: String) -> Result<(), KvError>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), KvError>;

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>, KvError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    /// The last pair must not be written unless every earlier pair was.
    async fn multi_set(&self, pairs: Vec<(String, String)>) -> Result<(), KvError> {
        for (key, value) in pairs {
            self.set(&key, value).await?;
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<(), KvError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        (**self).remove(key).await
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>, KvError> {
        (**self).multi_get(keys).await
    }

    async fn multi_set(&self, pairs: Vec<(String, String)>) -> Result<(), KvError> {
        (**self).multi_set(pairs).await
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<(), KvError> {
        (**self).multi_remove(keys).await
    }
}
