//! Static feed archive client.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::error::FeedError;

/// Default feed location: Wrocław open-data GTFS archive.
pub const DEFAULT_FEED_URL: &str = "https://www.wroclaw.pl/open-data/87b09b32-f076-4475-8ec9-6020ed1f9ac0/OtwartyWroclaw_rozklad_jazdy_GTFS.zip";

/// Where the feed archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Download over HTTP(S)
    Http(String),
    /// Read a local zip file (development and tests)
    File(PathBuf),
}

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Archive location
    pub source: FeedSource,
    /// Timeout for the whole download in seconds
    pub timeout_secs: u64,
}

impl FeedClientConfig {
    pub fn new(source: FeedSource) -> Self {
        Self {
            source,
            timeout_secs: 60,
        }
    }

    /// Set the download timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self::new(FeedSource::Http(DEFAULT_FEED_URL.to_string()))
    }
}

/// Fetches raw feed archive bytes.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    source: FeedSource,
}

impl FeedClient {
    pub fn new(config: FeedClientConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            source: config.source,
        })
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    /// Fetch the archive.
    ///
    /// A timeout surfaces as [`FeedError::Http`], like any other network failure.
    pub async fn fetch(&self) -> Result<Vec<u8>, FeedError> {
        match &self.source {
            FeedSource::Http(url) => {
                let response = self.http.get(url).send().await?;
                let status = response.status();

                if !status.is_success() {
                    let message = status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string();
                    return Err(FeedError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }

                let bytes = response.bytes().await?;
                debug!(bytes = bytes.len(), %url, "downloaded feed archive");
                Ok(bytes.to_vec())
            }
            FeedSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| FeedError::Io {
                    path: path.clone(),
                    source,
                })?;
                debug!(bytes = bytes.len(), path = %path.display(), "read feed archive");
                Ok(bytes)
            }
        }
    }
}
