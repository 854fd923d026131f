//! Core types and shared functionality for the APOD image cache.
//!
//! This crate provides:
//! - The SQLite-backed cache index
//! - Deterministic file naming and the local media store
//! - The cache manager and the fetcher trait it drives
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod manager;
pub mod store;

pub use cache::{ApodInfo, CacheDb, CacheLayout, CacheRecord, RecordId, SENTINEL_ID};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use fetcher::{ApodMetadata, ContentFetcher, FIRST_APOD_DATE, MediaType};
pub use manager::CacheManager;
pub use store::ContentStore;
