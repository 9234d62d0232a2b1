//! Identifier types for RateSync entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a stored snapshot or symbol-set row.
/// Uses UUID v7 so that in-memory ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new run ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Statically declared identifier of a data source.
///
/// Besides the real providers this also names the synthetic outputs of a
/// sync cycle (`combined` and `symbols`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub const FIXER: &'static str = "fixer";
    pub const FRANKFURTER: &'static str = "frankfurter";
    pub const COMBINED: &'static str = "combined";
    pub const SYMBOLS: &'static str = "symbols";

    /// Create a new provider ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn fixer() -> Self {
        Self::new(Self::FIXER)
    }

    pub fn frankfurter() -> Self {
        Self::new(Self::FRANKFURTER)
    }

    /// Synthetic provider under which merged rates are stored.
    pub fn combined() -> Self {
        Self::new(Self::COMBINED)
    }

    /// Synthetic result key for the symbol sync.
    pub fn symbols() -> Self {
        Self::new(Self::SYMBOLS)
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate the provider ID format.
    pub fn is_valid(&self) -> bool {
        // lowercase ascii, digits, dashes and underscores
        !self.0.is_empty()
            && self.0.len() <= 64
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
