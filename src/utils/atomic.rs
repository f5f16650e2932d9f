//! Atomic file replacement for the file-backed substrate.
//!
//! A value file is either the previous content or the new content, never a
//! torn write: data goes to a temp file in the same directory which is then
//! renamed over the target.

use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace the file at `path` with `content` atomically.
///
/// The temp file is created next to the target (a rename across filesystems
/// would not be atomic) and is cleaned up automatically if any step fails.
///
/// # Errors
///
/// Returns an `io::Error` if the parent directory is missing, the temp file
/// cannot be written, or the final rename fails.
pub async fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no parent directory"))?
        .to_path_buf();
    let target_path = path.to_path_buf();
    let content_owned = content.to_string();

    tokio::task::spawn_blocking(move || -> io::Result<()> {
        use std::io::Write;

        let mut temp_file = NamedTempFile::new_in(&parent)?;
        temp_file.write_all(content_owned.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&target_path)?;
        Ok(())
    })
    .await
    .map_err(io::Error::other)?
}
