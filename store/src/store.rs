//! Storage collaborator interface.

use async_trait::async_trait;
use chrono::NaiveDate;
use ratesync_common::{Currency, ProviderId, RateSnapshot, Rates, Result, RunId, SymbolSet, Symbols};

/// Append-only store of rate snapshots and symbol sets.
///
/// Rows are never updated. Each insert stamps `fetched_at` with the current
/// time and returns the new row's id; an insert that reports no written row
/// fails with `SyncError::Persistence`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append a rate snapshot.
    async fn insert_rate_snapshot(
        &self,
        provider: &ProviderId,
        base: &Currency,
        date: NaiveDate,
        rates: &Rates,
    ) -> Result<RunId>;

    /// Most recent rate snapshot for `provider`.
    async fn query_latest_snapshot(&self, provider: &ProviderId) -> Result<Option<RateSnapshot>>;

    /// Append a symbol set.
    async fn insert_symbol_set(&self, provider: &ProviderId, symbols: &Symbols) -> Result<RunId>;

    /// Most recent symbol set for `provider`.
    async fn query_latest_symbol_set(&self, provider: &ProviderId) -> Result<Option<SymbolSet>>;
}
