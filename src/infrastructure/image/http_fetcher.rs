//! HTTP image fetcher backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};

use crate::domain::entities::LoadedImage;
use crate::domain::errors::{LoadError, LoadResult};
use crate::domain::ports::ImageFetchPort;

/// Downloads images over HTTP and decodes them off the async runtime.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpImageFetcher {
    /// Creates a fetcher with a per-request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> LoadResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cardmedia/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LoadError::network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    /// Downloads raw bytes from a URL.
    async fn download(&self, url: &str) -> LoadResult<Bytes> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::Timeout {
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }
            } else {
                LoadError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        trace!(
            url = %url,
            content_type = ?response.headers().get(reqwest::header::CONTENT_TYPE),
            "Response headers received"
        );

        response
            .bytes()
            .await
            .map_err(|e| LoadError::network(format!("Failed to read body: {e}")))
    }
}

#[async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> LoadResult<LoadedImage> {
        debug!(url = %url, "Downloading image from network");
        let bytes = self.download(url).await?;
        let byte_len = bytes.len();

        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| LoadError::decode(format!("Decode task panicked: {e}")))?
            .map_err(|e| LoadError::decode(format!("Failed to decode image: {e}")))?;

        Ok(LoadedImage::new(url, decoded, byte_len))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
