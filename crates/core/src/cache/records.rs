//! Cache record operations.
//!
//! Records are append-only: inserted once per content identity and never
//! updated or deleted by this crate. A record can also be reached through
//! aliases, extra identities whose bytes turned out to be identical.

use super::connection::CacheDb;
use super::hash::validate_hash;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Identifier assigned by the index on insert.
pub type RecordId = i64;

/// Reserved id meaning "no record" or "operation failed". Never assigned.
pub const SENTINEL_ID: RecordId = 0;

const RECORD_COLUMNS: &str = "id, content_identity, title, explanation, local_path, content_hash, apod_date, \
                              media_type, cached_at";

/// A cached APOD entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub id: RecordId,
    pub content_identity: String,
    pub title: String,
    pub explanation: String,
    pub local_path: String,
    pub content_hash: Option<String>,
    pub apod_date: Option<String>,
    pub media_type: Option<String>,
    pub cached_at: String,
}

/// Fields of a record before the index assigns its id.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub content_identity: String,
    pub title: String,
    pub explanation: String,
    pub local_path: String,
    pub content_hash: Option<String>,
    pub apod_date: Option<String>,
    pub media_type: Option<String>,
}

/// What a downstream viewer needs to show a cached image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApodInfo {
    pub title: String,
    pub explanation: String,
    pub local_path: String,
}

impl From<CacheRecord> for ApodInfo {
    fn from(record: CacheRecord) -> Self {
        Self { title: record.title, explanation: record.explanation, local_path: record.local_path }
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CacheRecord> {
    Ok(CacheRecord {
        id: row.get(0)?,
        content_identity: row.get(1)?,
        title: row.get(2)?,
        explanation: row.get(3)?,
        local_path: row.get(4)?,
        content_hash: row.get(5)?,
        apod_date: row.get(6)?,
        media_type: row.get(7)?,
        cached_at: row.get(8)?,
    })
}

impl CacheDb {
    /// Insert a new record and return its id.
    ///
    /// Runs in its own transaction: either the row is committed and its id
    /// returned, or nothing is written. A duplicate content identity or local
    /// path violates a UNIQUE constraint and fails.
    pub async fn insert_record(&self, record: &NewRecord) -> Result<RecordId, Error> {
        let record = record.clone();
        let cached_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<RecordId, Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO image_cache (
                    content_identity, title, explanation, local_path,
                    content_hash, apod_date, media_type, cached_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        &record.content_identity,
                        &record.title,
                        &record.explanation,
                        &record.local_path,
                        &record.content_hash,
                        &record.apod_date,
                        &record.media_type,
                        &cached_at,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(id)
            })
            .await
            .map_err(Error::from)
    }

    /// Record another identity for an existing record.
    ///
    /// Used when a new URL downloads to bytes already cached, so the next
    /// lookup of that URL hits without a download. Fails if the identity is
    /// already an alias or if `record_id` does not exist.
    pub async fn add_alias(&self, content_identity: &str, record_id: RecordId) -> Result<(), Error> {
        let content_identity = content_identity.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO content_aliases (content_identity, record_id, created_at) VALUES (?1, ?2, ?3)",
                    params![content_identity, record_id, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a record by its content identity or one of its aliases (exact match).
    pub async fn find_by_identity(&self, content_identity: &str) -> Result<Option<CacheRecord>, Error> {
        let content_identity = content_identity.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRecord>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM image_cache
                     WHERE content_identity = ?1
                        OR id = (SELECT record_id FROM content_aliases WHERE content_identity = ?1)
                     ORDER BY id LIMIT 1"
                ))?;
                let record = stmt.query_row(params![content_identity], record_from_row).optional()?;
                Ok(record)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the id of the record whose bytes hash to `content_hash`.
    ///
    /// Returns None if no record carries that hash.
    pub async fn find_by_hash(&self, content_hash: &str) -> Result<Option<RecordId>, Error> {
        validate_hash(content_hash)?;
        let content_hash = content_hash.to_ascii_lowercase();
        self.conn
            .call(move |conn| -> Result<Option<RecordId>, Error> {
                let id = conn
                    .query_row(
                        "SELECT id FROM image_cache WHERE content_hash = ?1 ORDER BY id LIMIT 1",
                        params![content_hash],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(id)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the record stored at `local_path`.
    pub async fn find_by_path(&self, local_path: &str) -> Result<Option<CacheRecord>, Error> {
        let local_path = local_path.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRecord>, Error> {
                let mut stmt =
                    conn.prepare(&format!("SELECT {RECORD_COLUMNS} FROM image_cache WHERE local_path = ?1"))?;
                let record = stmt.query_row(params![local_path], record_from_row).optional()?;
                Ok(record)
            })
            .await
            .map_err(Error::from)
    }

    /// Get a record by id.
    ///
    /// Fails with [`Error::NotFound`] if the id was never assigned.
    pub async fn find_by_id(&self, id: RecordId) -> Result<CacheRecord, Error> {
        self.conn
            .call(move |conn| -> Result<CacheRecord, Error> {
                let mut stmt = conn.prepare(&format!("SELECT {RECORD_COLUMNS} FROM image_cache WHERE id = ?1"))?;
                match stmt.query_row(params![id], record_from_row) {
                    Ok(record) => Ok(record),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::NotFound(format!("record id {id}"))),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Title, explanation and file path for a record.
    pub async fn get_info(&self, id: RecordId) -> Result<ApodInfo, Error> {
        self.find_by_id(id).await.map(ApodInfo::from)
    }

    /// Titles of every cached record, in insertion order.
    pub async fn list_all_titles(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT title FROM image_cache ORDER BY id")?;
                let titles = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(titles)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of cached records.
    pub async fn count_records(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM image_cache", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
