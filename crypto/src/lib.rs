//! RateSync Hashing
//!
//! Fingerprint / validator logic behind conditional HTTP caching.

pub mod fingerprint;

pub use fingerprint::{cache_control, canonical_json, fingerprint, matches};

/// Errors from fingerprinting.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Payload cannot be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
