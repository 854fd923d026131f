//! Fetch-if-absent orchestration over the index, the store and a fetcher.
//!
//! One call to [`CacheManager::try_ensure_cached`] walks
//! validate -> metadata -> lookup -> (hit | bytes -> store -> insert).
//! Any failing step ends the call; nothing is retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::cache::hash::content_hash;
use crate::cache::{ApodInfo, CacheDb, CacheLayout, NewRecord, RecordId, SENTINEL_ID};
use crate::fetcher::{ApodMetadata, ContentFetcher, FIRST_APOD_DATE};
use crate::store::{ContentStore, paths};
use crate::{AppConfig, Error};

/// Orchestrates the image cache for one cache directory.
pub struct CacheManager {
    db: CacheDb,
    store: ContentStore,
    layout: CacheLayout,
    fetcher: Arc<dyn ContentFetcher>,
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager").field("layout", &self.layout).finish_non_exhaustive()
    }
}

impl CacheManager {
    /// Initialize the cache under the configured root and build a manager.
    pub async fn new(config: &AppConfig, fetcher: Arc<dyn ContentFetcher>) -> Result<Self, Error> {
        Self::open(&config.cache_root, fetcher).await
    }

    /// Initialize the cache under `root` and build a manager.
    pub async fn open(root: impl AsRef<Path>, fetcher: Arc<dyn ContentFetcher>) -> Result<Self, Error> {
        let (db, layout) = CacheDb::initialize(root).await?;
        let store = ContentStore::new(layout.images_dir.clone());
        Ok(Self { db, store, layout, fetcher })
    }

    /// On-disk locations owned by this cache.
    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// The underlying index.
    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Ensure the APOD for `date` is cached, returning its id or 0.
    ///
    /// Every failure collapses to [`SENTINEL_ID`]; the cause is logged.
    pub async fn ensure_cached(&self, date: NaiveDate) -> RecordId {
        match self.try_ensure_cached(date).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(%date, code = e.code(), error = %e, "failed to cache APOD");
                SENTINEL_ID
            }
        }
    }

    /// Ensure the APOD for `date` is cached, returning its id.
    ///
    /// A given content identity is downloaded and stored at most once.
    pub async fn try_ensure_cached(&self, date: NaiveDate) -> Result<RecordId, Error> {
        validate_date(date, today())?;

        let metadata = self.fetcher.fetch_metadata(date).await?;
        let identity = metadata.content_identity().to_string();
        if identity.is_empty() {
            return Err(Error::UnsupportedMedia(format!(
                "{date}: media type '{}' has no image URL",
                metadata.media_type.as_str()
            )));
        }

        if let Some(existing) = self.db.find_by_identity(&identity).await? {
            tracing::info!(%date, id = existing.id, "APOD already cached");
            return Ok(existing.id);
        }

        tracing::info!(%date, title = %metadata.title.trim(), "APOD not cached, downloading");
        self.add_to_cache(&metadata, &identity).await
    }

    async fn add_to_cache(&self, metadata: &ApodMetadata, identity: &str) -> Result<RecordId, Error> {
        let path = self.unclaimed_path(metadata, identity).await?;

        let bytes = self.fetcher.fetch_bytes(identity).await?;
        let digest = content_hash(&bytes);

        if let Some(id) = self.db.find_by_hash(&digest).await? {
            tracing::info!(id, hash = %digest, "identical image already cached under another URL");
            self.db.add_alias(identity, id).await?;
            return Ok(id);
        }

        self.store.save(&path, &bytes).await?;

        let record = NewRecord {
            content_identity: identity.to_string(),
            title: metadata.title.clone(),
            explanation: metadata.explanation.clone(),
            local_path: path.to_string_lossy().into_owned(),
            content_hash: Some(digest),
            apod_date: Some(metadata.date.to_string()),
            media_type: Some(metadata.media_type.as_str().to_string()),
        };

        match self.db.insert_record(&record).await {
            Ok(id) => {
                tracing::info!(id, path = %record.local_path, "APOD added to cache");
                Ok(id)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.remove(&path).await {
                    tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove orphaned file");
                }
                Err(e)
            }
        }
    }

    /// Resolved path for this content, disambiguated if another record owns it.
    async fn unclaimed_path(&self, metadata: &ApodMetadata, identity: &str) -> Result<PathBuf, Error> {
        let path = self.store.path_for(&metadata.title, identity);
        let owned_by_other = self
            .db
            .find_by_path(&path.to_string_lossy())
            .await?
            .is_some_and(|r| r.content_identity != identity);

        if !owned_by_other {
            return Ok(path);
        }

        let alt = paths::disambiguate(&path, identity);
        if self.db.find_by_path(&alt.to_string_lossy()).await?.is_some() {
            return Err(Error::StoreError(format!("{} and {} are both taken", path.display(), alt.display())));
        }
        tracing::debug!(from = %path.display(), to = %alt.display(), "local path already taken");
        Ok(alt)
    }

    /// Title, explanation and file path of a cached record.
    pub async fn get_info(&self, id: RecordId) -> Result<ApodInfo, Error> {
        self.db.get_info(id).await
    }

    /// Titles of all cached records, oldest first.
    pub async fn list_all_titles(&self) -> Result<Vec<String>, Error> {
        self.db.list_all_titles().await
    }

    /// Check that a record's file exists and still matches its stored hash.
    ///
    /// Records without a hash only need their file to exist.
    pub async fn verify(&self, id: RecordId) -> Result<bool, Error> {
        let record = self.db.find_by_id(id).await?;
        let path = Path::new(&record.local_path);

        if !self.store.exists(path).await? {
            tracing::warn!(id, path = %path.display(), "cached file is missing");
            return Ok(false);
        }

        let Some(expected) = record.content_hash else {
            return Ok(true);
        };

        let actual = self.store.hash_file(path).await?;
        if actual != expected {
            tracing::warn!(id, %expected, %actual, "cached file does not match its hash");
            return Ok(false);
        }
        Ok(true)
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Reject dates before the first APOD or after `today`.
pub fn validate_date(date: NaiveDate, today: NaiveDate) -> Result<(), Error> {
    if date < FIRST_APOD_DATE {
        return Err(Error::InvalidDate(format!("{date} is before the first APOD ({FIRST_APOD_DATE})")));
    }
    if date > today {
        return Err(Error::InvalidDate(format!("{date} is in the future")));
    }
    Ok(())
}
