//! Error types for object storage operations

use std::time::Duration;
use thiserror::Error;

/// Object storage errors
///
/// `BucketNotFound` is the only "not found" condition callers are expected
/// to recover from; everything else is a transport failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("Invalid object key: '{key}'")]
    InvalidKey { key: String },

    #[error("Invalid storage endpoint: {url} - {reason}")]
    InvalidEndpoint { url: String, reason: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether this is the recoverable "bucket does not exist" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::BucketNotFound { .. })
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Map a transport failure of a client configured with `timeout`
    pub fn from_transport(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            StorageError::Timeout {
                seconds: timeout.as_secs(),
            }
        } else if e.is_connect() {
            StorageError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            StorageError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            StorageError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<url::ParseError> for StorageError {
    fn from(e: url::ParseError) -> Self {
        StorageError::InvalidEndpoint {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}
