//! Dataset fetch error types.

/// Errors that can occur while obtaining dataset bytes.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not valid gzip
    #[error("failed to decompress dataset: {0}")]
    Decompress(#[source] std::io::Error),

    /// Cache operation failed
    #[error("cache error: {message}")]
    Cache { message: String },
}
