//! Snapshot records and sync outcomes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Currency, ProviderId, Rates, RunId, Symbols};

/// One provider's rates for one sync, already normalized to the reference
/// currency, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSnapshot {
    /// Provider that produced the rates.
    pub provider: ProviderId,
    /// Base the rates are expressed against (always the reference currency).
    pub base_currency: Currency,
    /// Date the provider reports the rates for.
    pub as_of_date: NaiveDate,
    /// Reference-normalized rates.
    pub rates: Rates,
}

/// A persisted, immutable rate snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub id: RunId,
    pub provider: ProviderId,
    pub base_currency: Currency,
    pub as_of_date: NaiveDate,
    /// Fetch timestamp exactly as the store reports it.
    ///
    /// Kept as text: a corrupt value must surface as "stale", not as a
    /// decoding failure of the whole row.
    pub fetched_at: String,
    pub rates: Rates,
}

/// One provider's currency display names, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSymbolSet {
    pub provider: ProviderId,
    pub symbols: Symbols,
}

/// A persisted, immutable symbol set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSet {
    pub id: RunId,
    pub provider: ProviderId,
    pub fetched_at: String,
    pub symbols: Symbols,
}

/// Successful result of a provider fetch.
///
/// `Unavailable` means the adapter is structurally disabled (for example a
/// missing credential). It is a silent skip, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fetched(T),
    Unavailable,
}

impl<T> FetchOutcome<T> {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchOutcome::Unavailable)
    }

    /// Convert into an `Option`, dropping the unavailable marker.
    pub fn fetched(self) -> Option<T> {
        match self {
            FetchOutcome::Fetched(value) => Some(value),
            FetchOutcome::Unavailable => None,
        }
    }
}

/// Reason a provider was not fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The latest stored row is still inside its TTL.
    #[serde(rename = "fresh-cache")]
    FreshCache,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FreshCache => write!(f, "fresh-cache"),
        }
    }
}

/// Per-provider result of a sync cycle.
///
/// Serializes as `{"run_id": ...}`, `{"skipped": "fresh-cache"}` or
/// `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    #[serde(rename = "run_id")]
    Stored(RunId),
    #[serde(rename = "skipped")]
    Skipped(SkipReason),
    #[serde(rename = "error")]
    Failed(String),
}

impl SyncOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, SyncOutcome::Stored(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }

    /// The stored row id, if any.
    pub fn run_id(&self) -> Option<RunId> {
        match self {
            SyncOutcome::Stored(id) => Some(*id),
            _ => None,
        }
    }
}

/// Full result of one sync invocation, keyed by provider.
///
/// Built fresh on every invocation and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub providers: BTreeMap<ProviderId, SyncOutcome>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for a provider, replacing any previous entry.
    pub fn record(&mut self, provider: ProviderId, outcome: SyncOutcome) {
        self.providers.insert(provider, outcome);
    }

    /// Merge another report into this one.
    pub fn extend(&mut self, other: SyncReport) {
        self.providers.extend(other.providers);
    }

    pub fn get(&self, provider: &str) -> Option<&SyncOutcome> {
        self.providers.get(&ProviderId::new(provider))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Count of (stored, skipped, failed) entries.
    pub fn tally(&self) -> (usize, usize, usize) {
        self.providers
            .values()
            .fold((0, 0, 0), |(stored, skipped, failed), outcome| match outcome {
                SyncOutcome::Stored(_) => (stored + 1, skipped, failed),
                SyncOutcome::Skipped(_) => (stored, skipped + 1, failed),
                SyncOutcome::Failed(_) => (stored, skipped, failed + 1),
            })
    }
}
