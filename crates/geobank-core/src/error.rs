// crates/geobank-core/src/error.rs
use std::io;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Failure of a single fetch attempt.
///
/// Every variant is considered transient by the retry loop: a bad HTTP
/// status is retried exactly like a dropped connection.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("failed to read response body: {0}")]
    Body(#[source] io::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum GeoError {
    /// All attempts for `url` failed. `source` is the last attempt's cause.
    #[error("fetching {url} failed after {attempts} attempt(s): {source}")]
    Fetch {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive has no entry named {0:?}")]
    MissingEntry(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(String),
}
