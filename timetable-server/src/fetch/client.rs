//! HTTP download of the published dataset.

use std::future::Future;
use std::io::Read;

use flate2::read::GzDecoder;
use tracing::info;

use super::error::FetchError;

/// Default location of the published, gzip-compressed dataset.
pub const DEFAULT_DATASET_URL: &str = "https://mradomski.top/scheduler/latest.json.gz";

/// Something that can produce the decompressed dataset bytes.
pub trait DatasetSource: Send + Sync {
    /// Obtain a fresh copy of the dataset.
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Configuration for the HTTP dataset client.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// URL of the gzip-compressed dataset
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HttpSourceConfig {
    /// Create a config for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: 60,
        }
    }

    /// Set a custom timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATASET_URL)
    }
}

/// Downloads the dataset over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    url: String,
}

impl HttpSource {
    /// Create a new HTTP dataset client.
    pub fn new(config: HttpSourceConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
        })
    }
}

impl DatasetSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        info!(url = %self.url, "downloading timetable");

        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.bytes().await?;
        decompress(&body)
    }
}

/// Gunzip `body`, passing through data that is not gzip-compressed.
pub fn decompress(body: &[u8]) -> Result<Vec<u8>, FetchError> {
    if !body.starts_with(&[0x1f, 0x8b]) {
        return Ok(body.to_vec());
    }

    let mut out = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut out)
        .map_err(FetchError::Decompress)?;
    Ok(out)
}
