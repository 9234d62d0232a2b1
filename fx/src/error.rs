//! Transport error types.

use ratesync_common::SyncError;
use thiserror::Error;

/// Errors raised while talking to a provider endpoint.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// Request could not be sent or the connection failed.
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// Request exceeded its timeout.
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// Endpoint answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Body was not valid JSON.
    #[error("Invalid response body from {url}: {message}")]
    Decode { url: String, message: String },
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        SyncError::Transport(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
