//! Error types for RateSync.

use crate::ProviderId;
use thiserror::Error;

/// Failure of a single provider's or symbol set's contribution to a sync.
///
/// Every variant is caught at the orchestrator boundary and turned into a
/// per-provider result entry; none of them aborts a whole cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The remote API answered with its own error envelope.
    #[error("{provider} error: {detail}")]
    ProviderRejected { provider: ProviderId, detail: String },

    /// Network or HTTP failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store reported no written row, or could not be reached.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Malformed rate data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Rebasing against a zero reference rate.
    #[error("Division by zero: {0}")]
    DivisionByZero(String),
}

impl SyncError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::ProviderRejected { .. } => "PROVIDER_REJECTED",
            SyncError::Transport(_) => "TRANSPORT_ERROR",
            SyncError::Persistence(_) => "PERSISTENCE_ERROR",
            SyncError::InvalidInput(_) => "INVALID_INPUT",
            SyncError::DivisionByZero(_) => "DIVISION_BY_ZERO",
        }
    }
}

/// Result type alias for RateSync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
