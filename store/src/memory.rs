//! In-process store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use ratesync_common::{
    format_timestamp, now, Currency, ProviderId, RateSnapshot, Rates, Result, RunId, SyncError,
    SymbolSet, Symbols,
};
use tracing::{debug, info};

use crate::store::SnapshotStore;

/// Store holding every row in memory, newest last per provider.
///
/// Used when no database is configured, and by tests. Rows can be seeded
/// with arbitrary `fetched_at` text, and writes can be made to report no
/// written row.
#[derive(Default)]
pub struct MemoryStore {
    rates: DashMap<ProviderId, Vec<RateSnapshot>>,
    symbols: DashMap<ProviderId, Vec<SymbolSet>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pre-built rate snapshot as-is.
    pub fn seed_rate_snapshot(&self, snapshot: RateSnapshot) {
        self.rates
            .entry(snapshot.provider.clone())
            .or_default()
            .push(snapshot);
    }

    /// Append a pre-built symbol set as-is.
    pub fn seed_symbol_set(&self, set: SymbolSet) {
        self.symbols.entry(set.provider.clone()).or_default().push(set);
    }

    /// Make subsequent inserts report that no row was written.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// All rate snapshots for `provider`, oldest first.
    pub fn rate_history(&self, provider: &ProviderId) -> Vec<RateSnapshot> {
        self.rates
            .get(provider)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Number of symbol sets for `provider`.
    pub fn symbol_set_count(&self, provider: &ProviderId) -> usize {
        self.symbols.get(provider).map(|rows| rows.len()).unwrap_or(0)
    }

    fn check_writable(&self, table: &str, provider: &ProviderId) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Persistence(format!(
                "Failed to insert {} for provider={}",
                table, provider
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn insert_rate_snapshot(
        &self,
        provider: &ProviderId,
        base: &Currency,
        date: NaiveDate,
        rates: &Rates,
    ) -> Result<RunId> {
        self.check_writable("rates run", provider)?;

        let id = RunId::new();
        self.seed_rate_snapshot(RateSnapshot {
            id,
            provider: provider.clone(),
            base_currency: base.clone(),
            as_of_date: date,
            fetched_at: format_timestamp(now()),
            rates: rates.clone(),
        });

        info!(run_id = %id, provider = %provider, num_rates = rates.len(), "Stored rates run");
        Ok(id)
    }

    async fn query_latest_snapshot(&self, provider: &ProviderId) -> Result<Option<RateSnapshot>> {
        let latest = self
            .rates
            .get(provider)
            .and_then(|rows| rows.last().cloned());
        debug!(provider = %provider, found = latest.is_some(), "Latest rates lookup");
        Ok(latest)
    }

    async fn insert_symbol_set(&self, provider: &ProviderId, symbols: &Symbols) -> Result<RunId> {
        self.check_writable("symbols run", provider)?;

        let id = RunId::new();
        self.seed_symbol_set(SymbolSet {
            id,
            provider: provider.clone(),
            fetched_at: format_timestamp(now()),
            symbols: symbols.clone(),
        });

        info!(run_id = %id, provider = %provider, num_symbols = symbols.len(), "Stored symbols");
        Ok(id)
    }

    async fn query_latest_symbol_set(&self, provider: &ProviderId) -> Result<Option<SymbolSet>> {
        Ok(self
            .symbols
            .get(provider)
            .and_then(|rows| rows.last().cloned()))
    }
}
