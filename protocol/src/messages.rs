//! HTTP message types.
//!
//! These are the bodies served by the RateSync API. Response payloads are
//! also the input to the `ETag` fingerprint, so their serialized form is
//! part of the caching contract.

use chrono::NaiveDate;
use ratesync_common::{Currency, ProviderId, RateSnapshot, Rates, SymbolSet, Symbols, SyncReport};
use serde::{Deserialize, Serialize};

/// Liveness response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Latest rates for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesResponse {
    /// Currency the rates are quoted against.
    pub base: Currency,
    /// Date the rates apply to (`YYYY-MM-DD`).
    pub date: NaiveDate,
    /// When the snapshot was stored.
    pub fetched_at: String,
    /// Currency code to rate.
    pub rates: Rates,
}

impl From<RateSnapshot> for RatesResponse {
    fn from(snapshot: RateSnapshot) -> Self {
        Self {
            base: snapshot.base_currency,
            date: snapshot.as_of_date,
            fetched_at: snapshot.fetched_at,
            rates: snapshot.rates,
        }
    }
}

/// Latest currency display names for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolsResponse {
    pub provider: ProviderId,
    pub symbols: Symbols,
}

impl From<SymbolSet> for SymbolsResponse {
    fn from(set: SymbolSet) -> Self {
        Self {
            provider: set.provider,
            symbols: set.symbols,
        }
    }
}

/// Result of a manual sync trigger: `{"providers": {id: outcome}}`.
pub type SyncResponse = SyncReport;

/// Query string of `GET /rates/latest` and `GET /symbols/latest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestQuery {
    /// Provider to read; each endpoint has its own default.
    pub provider: Option<String>,
}

/// Query string of `POST /jobs/sync`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SyncQuery {
    /// Refetch even when stored data is fresh.
    #[serde(default)]
    pub force: bool,
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
