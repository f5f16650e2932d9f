//! Directory-backed substrate: one JSON file per key.

use super::{KvError, KvStore};
use crate::utils::atomic_write;
use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const VALUE_EXTENSION: &str = "json";

/// Persistent key-value substrate rooted at a directory.
///
/// Keys are escaped into file names: ASCII alphanumerics, `_` and `-` are kept
/// as-is, every other byte becomes `%XX`. Writes replace files atomically, so
/// each key individually is never torn.
#[derive(Debug, Clone)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Open (creating if needed) a substrate rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, KvError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Root directory holding the value files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, KvError> {
        if key.is_empty() {
            return Err(KvError::InvalidKey(key.to_string()));
        }
        Ok(self
            .dir
            .join(format!("{}.{VALUE_EXTENSION}", escape_key(key))))
    }
}

/// Escape a key into a file-name-safe stem.
#[must_use]
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push('%');
            out.push_str(&hex::encode([byte]));
        }
    }
    out
}

#[async_trait]
impl KvStore for FileKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        atomic_write(&path, &value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>, KvError> {
        try_join_all(keys.iter().map(|key| self.get(key))).await
    }

    /// Writes every pair but the last concurrently and waits for all of
    /// them to settle. The last pair is written only if they all succeeded.
    async fn multi_set(&self, mut pairs: Vec<(String, String)>) -> Result<(), KvError> {
        let Some((last_key, last_value)) = pairs.pop() else {
            return Ok(());
        };
        join_all(
            pairs
                .into_iter()
                .map(|(key, value)| async move { self.set(&key, value).await }),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<()>, KvError>>()?;
        self.set(&last_key, last_value).await
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<(), KvError> {
        try_join_all(keys.iter().map(|key| self.remove(key))).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod file_tests;
