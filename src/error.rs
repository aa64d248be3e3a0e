/// Error types shared across the gallery
///
/// Location errors are mostly recoverable: the resolver swallows
/// everything except `Unavailable`. Store errors always reach the caller.

use std::time::Duration;
use thiserror::Error;

/// Failures while resolving the device's current coordinate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// The user (or config) refused foreground location access
    #[error("location permission denied")]
    PermissionDenied,

    /// The precise fix did not arrive within the bounded wait
    #[error("no position fix within {0:?}")]
    Timeout(Duration),

    /// The on-device source reported an error
    #[error("position fix failed: {0}")]
    FixFailed(String),

    /// Every strategy in the fallback chain failed
    #[error("location unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Failures reported by the media record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open catalog: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog write failed: {0}")]
    Write(#[source] rusqlite::Error),

    #[error("catalog read failed: {0}")]
    Read(#[source] rusqlite::Error),

    #[error("no image with id {0}")]
    NotFound(i64),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("catalog is closed")]
    Closed,
}

/// Failures while loading the TOML config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] toml::de::Error),
}
