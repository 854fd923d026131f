//! Remote content model and the fetcher seam.
//!
//! The cache never talks HTTP itself. Anything that can produce APOD metadata
//! for a date and raw bytes for a URL can drive a [`crate::CacheManager`].

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Date of the first Astronomy Picture of the Day.
pub const FIRST_APOD_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1995, 6, 16) {
    Some(date) => date,
    None => panic!("invalid first APOD date"),
};

/// Kind of media an APOD entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    #[serde(other)]
    Other,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Other => "other",
        }
    }
}

/// APOD metadata as returned by the content API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApodMetadata {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub explanation: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub hdurl: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

impl ApodMetadata {
    /// Canonical URL used as the deduplication key.
    ///
    /// Images prefer `hdurl` over `url`. Videos use the thumbnail. Anything
    /// else has no identity and yields an empty string.
    pub fn content_identity(&self) -> &str {
        let candidate = match self.media_type {
            MediaType::Image => self.hdurl.as_deref().filter(|u| !u.trim().is_empty()).or(self.url.as_deref()),
            MediaType::Video => self.thumbnail_url.as_deref(),
            MediaType::Other => None,
        };
        candidate.map(str::trim).unwrap_or_default()
    }
}

/// Source of APOD metadata and media bytes.
///
/// Both calls may fail with a transport-level error, reported as
/// [`Error::FetchError`].
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch metadata for the APOD published on `date`.
    async fn fetch_metadata(&self, date: NaiveDate) -> Result<ApodMetadata, Error>;

    /// Fetch the raw bytes behind `url`.
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, Error>;
}
