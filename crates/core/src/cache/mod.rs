//! SQLite-backed index of cached APOD images.
//!
//! This module provides the persistent content-identity to record mapping
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Lookup by content identity, content hash, local path and id
//! - Transactional, append-only inserts with monotonic ids
//! - Automatic schema migrations

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod records;

pub use crate::Error;

pub use connection::{CacheDb, CacheLayout};
pub use records::{ApodInfo, CacheRecord, NewRecord, RecordId, SENTINEL_ID};
