//! Database connection management and on-disk cache layout.
//!
//! This module handles creating the cache directory tree, opening the SQLite
//! database, applying pragmas, and running migrations.

use super::migrations;
use crate::Error;
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;

/// Name of the cache directory created under the configured root.
pub const CACHE_DIR_NAME: &str = "image_cache";

/// Name of the media subdirectory inside the cache directory.
pub const IMAGES_DIR_NAME: &str = "images";

/// Name of the SQLite file inside the cache directory.
pub const DB_FILE_NAME: &str = "image_cache.sqlite";

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
                       PRAGMA synchronous=NORMAL;
                       PRAGMA temp_store=MEMORY;
                       PRAGMA foreign_keys=ON;";

/// Resolved locations of everything the cache owns on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    pub cache_dir: PathBuf,
    pub images_dir: PathBuf,
    pub db_path: PathBuf,
}

impl CacheLayout {
    /// Compute the layout for a root directory without touching the disk.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let cache_dir = root.as_ref().join(CACHE_DIR_NAME);
        Self { images_dir: cache_dir.join(IMAGES_DIR_NAME), db_path: cache_dir.join(DB_FILE_NAME), cache_dir }
    }
}

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. The connection closes when the last clone drops.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Create the cache directory tree and database under `root`.
    ///
    /// The returned layout is absolute, so stored paths do not depend on the
    /// working directory. Safe to call repeatedly: existing directories and
    /// schema are reused.
    pub async fn initialize(root: impl AsRef<Path>) -> Result<(Self, CacheLayout), Error> {
        let root = root.as_ref();
        let images_dir = CacheLayout::under(root).images_dir;

        tokio::fs::create_dir_all(&images_dir)
            .await
            .map_err(|e| Error::StoreError(format!("failed to create {}: {e}", images_dir.display())))?;

        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| Error::StoreError(format!("failed to resolve {}: {e}", root.display())))?;
        let layout = CacheLayout::under(root);

        let db = Self::open(&layout.db_path).await?;

        tracing::debug!(cache_dir = %layout.cache_dir.display(), "image cache initialized");

        Ok((db, layout))
    }

    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    /// Open an in-memory database for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same
    /// pragma configuration as file-based databases.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    async fn configure(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn test_layout_under_root() {
        let layout = CacheLayout::under("/data");
        assert_eq!(layout.cache_dir, PathBuf::from("/data/image_cache"));
        assert_eq!(layout.images_dir, PathBuf::from("/data/image_cache/images"));
        assert_eq!(layout.db_path, PathBuf::from("/data/image_cache/image_cache.sqlite"));
    }

    #[tokio::test]
    async fn test_initialize_creates_tree() {
        let root = tempfile::tempdir().unwrap();
        let (_db, layout) = CacheDb::initialize(root.path()).await.unwrap();

        assert!(layout.images_dir.is_dir());
        assert!(layout.db_path.is_file());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let (first, layout) = CacheDb::initialize(root.path()).await.unwrap();
        drop(first);

        let (_second, again) = CacheDb::initialize(root.path()).await.unwrap();
        assert_eq!(layout, again);
    }

    #[tokio::test]
    async fn test_initialize_resolves_root() {
        let root = tempfile::tempdir().unwrap();
        let indirect = root.path().join("nested").join("..").join("cache");

        let (_db, layout) = CacheDb::initialize(&indirect).await.unwrap();

        let expected = std::fs::canonicalize(root.path()).unwrap().join("cache").join(CACHE_DIR_NAME);
        assert!(layout.cache_dir.is_absolute());
        assert_eq!(layout.cache_dir, expected);
        assert!(layout.images_dir.is_dir());
    }
}
