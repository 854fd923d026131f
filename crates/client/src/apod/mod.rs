//! NASA Astronomy Picture of the Day API client.
//!
//! ### API
//!
//! - **Endpoint**: `https://api.nasa.gov/planetary/apod`
//! - **Authentication**: `api_key` query parameter (`DEMO_KEY` works, heavily rate limited).
//! - **Request**: one date per call, `thumbs=true` so videos carry a thumbnail URL.
//! - **Normalization**: media URLs are canonicalized before they become cache identities.
//! - **Failures**: surfaced once, never retried.

use apod_core::{ApodMetadata, AppConfig, ContentFetcher};
use bytes::Bytes;
use chrono::NaiveDate;

use crate::ClientError;
use crate::fetch::{FetchClient, FetchConfig, canonicalize, metadata_url};

/// Default APOD endpoint.
const DEFAULT_BASE_URL: &str = "https://api.nasa.gov/planetary/apod";

/// Key accepted by api.nasa.gov without registration.
const DEMO_API_KEY: &str = "DEMO_KEY";

/// APOD client configuration.
#[derive(Debug, Clone)]
pub struct ApodConfig {
    /// API key sent as the `api_key` query parameter.
    pub api_key: String,
    /// Base URL (default: https://api.nasa.gov/planetary/apod).
    pub base_url: String,
    /// HTTP settings shared by metadata and media requests.
    pub fetch: FetchConfig,
}

impl Default for ApodConfig {
    fn default() -> Self {
        Self { api_key: DEMO_API_KEY.to_string(), base_url: DEFAULT_BASE_URL.to_string(), fetch: FetchConfig::default() }
    }
}

impl From<&AppConfig> for ApodConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.clone(),
            fetch: FetchConfig {
                user_agent: config.user_agent.clone(),
                max_bytes: config.max_bytes,
                timeout: config.timeout(),
                ..FetchConfig::default()
            },
        }
    }
}

/// APOD API client.
#[derive(Debug, Clone)]
pub struct ApodClient {
    fetch: FetchClient,
    config: ApodConfig,
}

impl ApodClient {
    /// Create a new APOD client with the given configuration.
    pub fn new(config: ApodConfig) -> Result<Self, ClientError> {
        let fetch = FetchClient::new(config.fetch.clone())?;
        Ok(Self { fetch, config })
    }

    /// Create a client from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(ApodConfig::from(config))
    }

    /// Fetch and decode the APOD metadata for `date`.
    ///
    /// Media URLs in the result are canonicalized.
    pub async fn metadata(&self, date: NaiveDate) -> Result<ApodMetadata, ClientError> {
        let url = metadata_url(&self.config.base_url, &self.config.api_key, date)?;

        tracing::debug!("requesting APOD metadata for {}", date);

        let body = self.fetch.fetch(url.as_str(), "application/json").await?;
        let metadata: ApodMetadata = serde_json::from_slice(&body).map_err(|e| ClientError::Parse(e.to_string()))?;

        normalize(metadata)
    }

    /// Download the media bytes behind `url`.
    pub async fn download(&self, url: &str) -> Result<Bytes, ClientError> {
        self.fetch.fetch(url, "image/*,*/*;q=0.8").await
    }
}

/// Canonicalize every media URL in `metadata`; blank URLs become `None`.
fn normalize(mut metadata: ApodMetadata) -> Result<ApodMetadata, ClientError> {
    for field in [&mut metadata.url, &mut metadata.hdurl, &mut metadata.thumbnail_url] {
        *field = match field.take() {
            Some(raw) if !raw.trim().is_empty() => Some(canonicalize(&raw)?.to_string()),
            _ => None,
        };
    }
    Ok(metadata)
}

#[async_trait::async_trait]
impl ContentFetcher for ApodClient {
    async fn fetch_metadata(&self, date: NaiveDate) -> Result<ApodMetadata, apod_core::Error> {
        self.metadata(date).await.map_err(apod_core::Error::from)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, apod_core::Error> {
        self.download(url).await.map_err(apod_core::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apod_core::MediaType;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn serve_once(status: &'static str, content_type: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> ApodClient {
        ApodClient::new(ApodConfig { base_url, ..Default::default() }).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 5, 13).unwrap()
    }

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig { api_key: "abc".into(), max_bytes: 1024, timeout_ms: 500, ..Default::default() };
        let config = ApodConfig::from(&app);

        assert_eq!(config.api_key, "abc");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.fetch.max_bytes, 1024);
        assert_eq!(config.fetch.timeout, Duration::from_millis(500));
        assert_eq!(config.fetch.user_agent, "apod-cache/0.1");
    }

    #[test]
    fn test_normalize_canonicalizes_urls() {
        let metadata: ApodMetadata = serde_json::from_str(
            r#"{"date":"2022-05-13","title":"t","media_type":"video",
                "url":"//www.youtube.com/embed/abc#t","thumbnail_url":"https://IMG.youtube.com/vi/abc/0.jpg",
                "hdurl":"  "}"#,
        )
        .unwrap();

        let metadata = normalize(metadata).unwrap();

        assert_eq!(metadata.url.as_deref(), Some("https://www.youtube.com/embed/abc"));
        assert_eq!(metadata.thumbnail_url.as_deref(), Some("https://img.youtube.com/vi/abc/0.jpg"));
        assert_eq!(metadata.hdurl, None);
    }

    #[tokio::test]
    async fn test_metadata_decodes_response() {
        let body = br#"{"date":"2022-05-13","title":" NGC #3521: Galaxy in a Bubble ","explanation":"Gorgeous.",
            "media_type":"image","service_version":"v1",
            "url":"https://apod.nasa.gov/apod/image/2205/NGC3521_1024.jpg",
            "hdurl":"https://apod.nasa.gov/apod/image/2205/NGC3521LRGBHaAPOD-20.jpg"}"#;
        let base = serve_once("200 OK", "application/json", body.to_vec()).await;

        let metadata = client_for(base).metadata(date()).await.unwrap();

        assert_eq!(metadata.media_type, MediaType::Image);
        assert_eq!(metadata.title, " NGC #3521: Galaxy in a Bubble ");
        assert_eq!(metadata.content_identity(), "https://apod.nasa.gov/apod/image/2205/NGC3521LRGBHaAPOD-20.jpg");
    }

    #[tokio::test]
    async fn test_metadata_bad_status_is_fetch_error() {
        let body = br#"{"code":400,"msg":"Date must be between Jun 16, 1995 and May 13, 2022."}"#;
        let base = serve_once("400 Bad Request", "application/json", body.to_vec()).await;

        let err = client_for(base).fetch_metadata(date()).await.unwrap_err();

        assert!(matches!(err, apod_core::Error::FetchError(_)));
        assert!(err.to_string().contains("Date must be between"));
    }

    #[tokio::test]
    async fn test_metadata_garbage_is_parse_error() {
        let base = serve_once("200 OK", "text/html", b"<html>maintenance</html>".to_vec()).await;
        let result = client_for(base).metadata(date()).await;
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[tokio::test]
    async fn test_download_returns_bytes() {
        let base = serve_once("200 OK", "image/jpeg", b"\xff\xd8\xff jpeg".to_vec()).await;
        let bytes = client_for(String::new()).fetch_bytes(&format!("{base}/image.jpg")).await.unwrap();
        assert_eq!(&bytes[..], b"\xff\xd8\xff jpeg");
    }

    #[tokio::test]
    async fn test_download_respects_max_bytes() {
        let base = serve_once("200 OK", "image/jpeg", vec![0u8; 64]).await;
        let config = ApodConfig { fetch: FetchConfig { max_bytes: 16, ..FetchConfig::default() }, ..Default::default() };
        let client = ApodClient::new(config).unwrap();

        let result = client.download(&format!("{base}/big.jpg")).await;
        assert!(matches!(result, Err(ClientError::TooLarge { size: 64, max: 16 })));
    }

    #[tokio::test]
    async fn test_download_unreachable_is_fetch_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(String::new()).fetch_bytes(&format!("http://{addr}/a.jpg")).await.unwrap_err();
        assert!(matches!(err, apod_core::Error::FetchError(_)));
    }

    #[tokio::test]
    #[ignore = "requires network"]
    async fn test_live_metadata() {
        let client = ApodClient::new(ApodConfig::default()).unwrap();
        let metadata = client.metadata(date()).await.unwrap();
        assert!(!metadata.content_identity().is_empty());
    }
}
