//! Local filesystem storage for downloaded media.
//!
//! Writes go to a temporary sibling first, are synced, then renamed into
//! place, so a failed write never leaves a truncated file at the final path.

pub mod paths;

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::cache::hash::content_hash;

/// Filesystem store rooted at the cache's media directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a store scoped to `root`. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the path for a title and source URL inside this store.
    pub fn path_for(&self, title: &str, source_url: &str) -> PathBuf {
        paths::resolve(&self.root, title, source_url)
    }

    /// Write `bytes` to `path`, creating parent directories as needed.
    ///
    /// Returns the number of bytes written.
    pub async fn save(&self, path: &Path, bytes: &[u8]) -> Result<u64, Error> {
        self.check_scope(path)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::StoreError(format!("failed to create {}: {e}", parent.display())))?;
        }

        let temp_path = temp_sibling(path);
        if let Err(e) = write_synced(&temp_path, bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::StoreError(format!("failed to write {}: {e}", path.display())));
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::StoreError(format!("failed to move into {}: {e}", path.display())));
        }

        tracing::debug!(path = %path.display(), size = bytes.len(), "stored media file");
        Ok(bytes.len() as u64)
    }

    /// Whether a file exists at `path`.
    pub async fn exists(&self, path: &Path) -> Result<bool, Error> {
        fs::try_exists(path)
            .await
            .map_err(|e| Error::StoreError(format!("failed to stat {}: {e}", path.display())))
    }

    /// Read the file at `path`.
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, Error> {
        fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.display().to_string())
            } else {
                Error::StoreError(format!("failed to read {}: {e}", path.display()))
            }
        })
    }

    /// SHA-256 of the file at `path`.
    pub async fn hash_file(&self, path: &Path) -> Result<String, Error> {
        Ok(content_hash(&self.read(path).await?))
    }

    /// Remove a file written by this store. Missing files are not an error.
    pub async fn remove(&self, path: &Path) -> Result<(), Error> {
        self.check_scope(path)?;
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::StoreError(format!("failed to remove {}: {e}", path.display()))),
        }
    }

    fn check_scope(&self, path: &Path) -> Result<(), Error> {
        let escapes = path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
        if escapes || !path.starts_with(&self.root) {
            return Err(Error::StoreError(format!(
                "{} is outside the cache directory {}",
                path.display(),
                self.root.display()
            )));
        }
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp.{}", std::process::id()))
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
