//! Unified error types for the APOD image cache.
//!
//! Every variant renders with a stable code prefix so failures that collapse
//! to the sentinel id can still be diagnosed from the logs.

use tokio_rusqlite::rusqlite;

/// Unified error types for the image cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Date is before the first APOD or in the future.
    #[error("INVALID_DATE: {0}")]
    InvalidDate(String),

    /// Remote metadata or byte fetch failed.
    #[error("FETCH_ERROR: {0}")]
    FetchError(String),

    /// The APOD media type has no usable image URL.
    #[error("UNSUPPORTED_MEDIA: {0}")]
    UnsupportedMedia(String),

    /// Writing downloaded bytes to the cache directory failed.
    #[error("STORE_ERROR: {0}")]
    StoreError(String),

    /// No record matches the given id or hash.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Database failure reported by the connection layer in a form this crate
    /// does not model; carries the original message.
    #[error("CACHE_ERROR: {0}")]
    DatabaseOther(String),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid hash format.
    #[error("CACHE_ERROR: invalid hash format")]
    InvalidHash,

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Stable code for this error, matching the display prefix.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidDate(_) => "INVALID_DATE",
            Error::FetchError(_) => "FETCH_ERROR",
            Error::UnsupportedMedia(_) => "UNSUPPORTED_MEDIA",
            Error::StoreError(_) => "STORE_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Database(_) | Error::DatabaseOther(_) | Error::MigrationFailed(_) | Error::InvalidHash => {
                "CACHE_ERROR"
            }
            Error::InvalidUrl(_) => "INVALID_URL",
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            other => {
                tracing::error!(error = %other, "unrecognized database error");
                Error::DatabaseOther(other.to_string())
            }
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
