//! APOD client error types.

use std::sync::Arc;

/// Errors from the APOD API and media downloads.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// URL could not be canonicalized.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] crate::fetch::UrlError),

    /// API key rejected.
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Too many requests for this API key.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Non-success HTTP response.
    #[error("HTTP error: status {status}{}", detail(.message))]
    HttpError { status: u16, message: Option<String> },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body exceeds the configured limit.
    #[error("response too large: {size} bytes exceeds {max}")]
    TooLarge { size: u64, max: usize },

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default()
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ClientError::Timeout } else { ClientError::Network(Arc::new(err)) }
    }
}

impl From<ClientError> for apod_core::Error {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidUrl(e) => apod_core::Error::InvalidUrl(e.to_string()),
            other => apod_core::Error::FetchError(other.to_string()),
        }
    }
}
