//! Provider adapter traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use ratesync_common::{
    FetchOutcome, NormalizedSnapshot, NormalizedSymbolSet, ProviderId, Result, SyncError,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::transport::Transport;

/// A source of exchange rates.
///
/// Implementations return rates already rebased onto the reference
/// currency, or `Unavailable` when structurally disabled.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Statically declared provider identifier.
    fn id(&self) -> &ProviderId;

    /// Fetch the provider's latest rates.
    async fn fetch(&self, transport: &dyn Transport) -> Result<FetchOutcome<NormalizedSnapshot>>;
}

/// A source of currency display names.
#[async_trait]
pub trait SymbolSource: Send + Sync {
    /// Identifier the symbol set is stored and checked for freshness under.
    fn id(&self) -> &ProviderId;

    /// Fetch the provider's symbol list.
    async fn fetch_symbols(
        &self,
        transport: &dyn Transport,
    ) -> Result<FetchOutcome<NormalizedSymbolSet>>;
}

/// Decode a provider body into `T`, reporting shape mismatches as invalid input.
pub(crate) fn decode<T: DeserializeOwned>(provider: &ProviderId, body: Value) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| SyncError::InvalidInput(format!("malformed {} response: {}", provider, e)))
}

/// Parse a provider-reported `YYYY-MM-DD` date.
pub(crate) fn parse_date(provider: &ProviderId, raw: Option<&str>) -> Result<NaiveDate> {
    let raw = raw.ok_or_else(|| {
        SyncError::InvalidInput(format!("{} response has no date", provider))
    })?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        SyncError::InvalidInput(format!("{} response has invalid date {:?}: {}", provider, raw, e))
    })
}
