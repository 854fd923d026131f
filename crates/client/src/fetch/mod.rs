//! HTTP fetch pipeline shared by metadata and media requests.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Safety Gates
//! - Max redirects: 5
//! - Max body bytes: 50MB (configurable), checked against Content-Length
//!   before reading and against the body after
//! - Non-2xx responses are errors; nothing is retried

pub mod url;

use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize, metadata_url};

use crate::ClientError;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "apod-cache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 50MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "apod-cache/0.1".to_string(),
            max_bytes: 50 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// HTTP fetch client with size and status checks.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self { http, config })
    }

    /// Fetch a URL and return the response body.
    ///
    /// Non-success statuses become [`ClientError::HttpError`] carrying the
    /// body's text (truncated) so API error messages reach the logs.
    pub async fn fetch(&self, url_str: &str, accept: &str) -> Result<Bytes, ClientError> {
        let start = Instant::now();
        let url = canonicalize(url_str)?;

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, accept)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(ClientError::TooLarge { size: len, max: self.config.max_bytes });
        }

        let final_url = response.url().clone();
        let bytes = response.bytes().await?;

        if bytes.len() > self.config.max_bytes {
            return Err(ClientError::TooLarge { size: bytes.len() as u64, max: self.config.max_bytes });
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(bytes)
    }
}

/// Map a non-success status (and its body) to an error.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> ClientError {
    match status.as_u16() {
        401 | 403 => ClientError::AuthError,
        429 => ClientError::RateLimited,
        code => ClientError::HttpError { status: code, message: error_message(body) },
    }
}

/// Pull a human-readable message out of an error body.
///
/// The APOD API answers with `{"code": 400, "msg": "..."}`; anything else is
/// passed through, trimmed and truncated.
fn error_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ApiErrorBody {
        msg: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return Some(parsed.msg);
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "apod-cache/0.1");
        assert_eq!(config.max_bytes, 50 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(StatusCode::FORBIDDEN, ""), ClientError::AuthError));
        assert!(matches!(classify_status(StatusCode::TOO_MANY_REQUESTS, ""), ClientError::RateLimited));

        let err = classify_status(StatusCode::BAD_REQUEST, r#"{"code":400,"msg":"Date must be between Jun 16, 1995 and today."}"#);
        match err {
            ClientError::HttpError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("Date must be between Jun 16, 1995 and today."));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "  "),
            ClientError::HttpError { status: 502, message: None }
        ));
    }

    #[test]
    fn test_error_message_truncates_plain_bodies() {
        let body = "x".repeat(500);
        assert_eq!(error_message(&body).unwrap().len(), 200);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let result = client.fetch("ftp://apod.nasa.gov/a.jpg", "*/*").await;
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }
}
