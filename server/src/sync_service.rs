//! Rate synchronization orchestrator.
//!
//! One invocation walks every configured rate source in order, persists what
//! it fetched, merges the fresh results into the `combined` snapshot and,
//! independently, refreshes the currency symbol list. Every per-provider
//! failure is turned into an entry of the returned [`SyncReport`]; nothing a
//! single provider does aborts the cycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, instrument, warn};

use ratesync_common::{
    Currency, FetchOutcome, NormalizedSnapshot, ProviderId, Rates, Result, RunId, SkipReason,
    SyncOutcome, SyncReport,
};
use ratesync_fx::{
    merge_rates, merged_date, FixerSource, FrankfurterSource, RateSource, SymbolSource, Transport,
};
use ratesync_store::{FreshnessOracle, RecordKind, SnapshotStore};

use crate::config::SyncConfig;

/// Rates fetched and stored during one cycle, kept for the merge step.
#[derive(Default)]
struct MergeInputs {
    rates: BTreeMap<ProviderId, Rates>,
    dates: Vec<NaiveDate>,
}

impl MergeInputs {
    fn push(&mut self, snapshot: NormalizedSnapshot) {
        self.dates.push(snapshot.as_of_date);
        self.rates.insert(snapshot.provider, snapshot.rates);
    }
}

/// Orchestrates fetching, persisting and merging rates from all providers.
pub struct RatesSyncService {
    store: Arc<dyn SnapshotStore>,
    transport: Arc<dyn Transport>,
    rate_sources: Vec<Arc<dyn RateSource>>,
    symbol_source: Option<Arc<dyn SymbolSource>>,
    priority: Vec<ProviderId>,
    reference: Currency,
    rates_freshness: FreshnessOracle,
    symbols_freshness: FreshnessOracle,
}

impl RatesSyncService {
    /// Create a service with no sources attached.
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        transport: Arc<dyn Transport>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            rates_freshness: FreshnessOracle::new(
                store.clone(),
                RecordKind::Rates,
                config.rates_ttl_secs(),
            ),
            symbols_freshness: FreshnessOracle::new(
                store.clone(),
                RecordKind::Symbols,
                config.symbols_ttl_secs(),
            ),
            store,
            transport,
            rate_sources: Vec::new(),
            symbol_source: None,
            priority: config.provider_priority.clone(),
            reference: config.reference_currency.clone(),
        }
    }

    /// Create a service with the Fixer and Frankfurter rate sources, in that
    /// order, and Fixer as the symbol source.
    pub fn with_default_sources(
        store: Arc<dyn SnapshotStore>,
        transport: Arc<dyn Transport>,
        fixer_api_key: Option<String>,
        config: &SyncConfig,
    ) -> Self {
        let fixer = Arc::new(FixerSource::new(
            fixer_api_key,
            config.reference_currency.clone(),
        ));
        let frankfurter = Arc::new(FrankfurterSource::new(config.reference_currency.clone()));

        Self::new(store, transport, config)
            .with_rate_source(fixer.clone())
            .with_rate_source(frankfurter)
            .with_symbol_source(fixer)
    }

    /// Append a rate source. Sources are synced in the order they are added.
    pub fn with_rate_source(mut self, source: Arc<dyn RateSource>) -> Self {
        self.rate_sources.push(source);
        self
    }

    /// Set the symbol source.
    pub fn with_symbol_source(mut self, source: Arc<dyn SymbolSource>) -> Self {
        self.symbol_source = Some(source);
        self
    }

    /// Identifiers of the configured rate sources, in sync order.
    pub fn rate_providers(&self) -> Vec<ProviderId> {
        self.rate_sources.iter().map(|s| s.id().clone()).collect()
    }

    /// Merge priority.
    pub fn priority(&self) -> &[ProviderId] {
        &self.priority
    }

    /// Reference currency.
    pub fn reference(&self) -> &Currency {
        &self.reference
    }

    /// Sync rates and symbols.
    ///
    /// With `force` set, freshness checks are bypassed and every source is
    /// fetched. The two halves run concurrently and never affect each other.
    #[instrument(skip(self))]
    pub async fn sync_all(&self, force: bool) -> SyncReport {
        info!(force, "Starting sync");

        let (mut report, symbols) = tokio::join!(self.sync_rates(force), self.sync_symbols(force));
        report.extend(symbols);

        let (stored, skipped, failed) = report.tally();
        info!(stored, skipped, failed, results = report.len(), "Sync complete");
        report
    }

    /// Sync every rate source in order, then build the combined snapshot.
    #[instrument(skip(self))]
    pub async fn sync_rates(&self, force: bool) -> SyncReport {
        let mut report = SyncReport::new();
        let mut inputs = MergeInputs::default();

        for source in &self.rate_sources {
            let provider = source.id().clone();

            if !force && self.rates_freshness.is_fresh(&provider).await {
                info!(provider = %provider, "Skipping provider: cache is fresh");
                report.record(provider, SyncOutcome::Skipped(SkipReason::FreshCache));
                continue;
            }

            info!(provider = %provider, "Syncing rates");
            match self.sync_source(source.as_ref()).await {
                Ok(Some((run_id, snapshot))) => {
                    info!(
                        provider = %provider,
                        run_id = %run_id,
                        num_rates = snapshot.rates.len(),
                        "Provider synced"
                    );
                    report.record(provider, SyncOutcome::Stored(run_id));
                    inputs.push(snapshot);
                }
                Ok(None) => {
                    warn!(provider = %provider, "No result from provider");
                }
                Err(e) => {
                    error!(
                        provider = %provider,
                        error = %e,
                        code = e.error_code(),
                        retryable = e.is_retryable(),
                        "Provider sync failed"
                    );
                    report.record(provider, SyncOutcome::Failed(e.to_string()));
                }
            }
        }

        if let Some(outcome) = self.sync_combined(&inputs, force).await {
            report.record(ProviderId::combined(), outcome);
        }

        report
    }

    /// Refresh the symbol list. The outcome is reported under `symbols`.
    #[instrument(skip(self))]
    pub async fn sync_symbols(&self, force: bool) -> SyncReport {
        let mut report = SyncReport::new();

        let Some(source) = self.symbol_source.as_ref() else {
            return report;
        };

        let provider = source.id();
        if !force && self.symbols_freshness.is_fresh(provider).await {
            info!(provider = %provider, "Skipping symbols sync: cache is fresh");
            report.record(ProviderId::symbols(), SyncOutcome::Skipped(SkipReason::FreshCache));
            return report;
        }

        info!(provider = %provider, "Syncing currency symbols");
        let outcome = match source.fetch_symbols(self.transport.as_ref()).await {
            Ok(FetchOutcome::Fetched(set)) => {
                match self.store.insert_symbol_set(&set.provider, &set.symbols).await {
                    Ok(run_id) => {
                        info!(run_id = %run_id, num_symbols = set.symbols.len(), "Symbols synced");
                        Some(SyncOutcome::Stored(run_id))
                    }
                    Err(e) => {
                        error!(provider = %provider, error = %e, "Storing symbols failed");
                        Some(SyncOutcome::Failed(e.to_string()))
                    }
                }
            }
            Ok(FetchOutcome::Unavailable) => {
                warn!(provider = %provider, "No symbols returned");
                None
            }
            Err(e) => {
                error!(provider = %provider, error = %e, "Symbols sync failed");
                Some(SyncOutcome::Failed(e.to_string()))
            }
        };

        if let Some(outcome) = outcome {
            report.record(ProviderId::symbols(), outcome);
        }
        report
    }

    /// Fetch one source and persist the result.
    async fn sync_source(
        &self,
        source: &dyn RateSource,
    ) -> Result<Option<(RunId, NormalizedSnapshot)>> {
        let snapshot = match source.fetch(self.transport.as_ref()).await? {
            FetchOutcome::Fetched(snapshot) => snapshot,
            FetchOutcome::Unavailable => return Ok(None),
        };

        let run_id = self
            .store
            .insert_rate_snapshot(
                &snapshot.provider,
                &snapshot.base_currency,
                snapshot.as_of_date,
                &snapshot.rates,
            )
            .await?;

        Ok(Some((run_id, snapshot)))
    }

    /// Merge this cycle's fetched rates and store them under `combined`.
    ///
    /// Returns `None` when a forced cycle fetched nothing.
    async fn sync_combined(&self, inputs: &MergeInputs, force: bool) -> Option<SyncOutcome> {
        let Some(date) = merged_date(inputs.dates.iter()) else {
            if force {
                warn!("No provider rates available for combining");
                return None;
            }
            info!("No new rates fetched, combined rates skipped");
            return Some(SyncOutcome::Skipped(SkipReason::FreshCache));
        };

        let merged = merge_rates(&inputs.rates, &self.priority, &self.reference);
        info!(
            providers = inputs.rates.len(),
            date = %date,
            num_rates = merged.len(),
            "Creating combined rates"
        );

        match self
            .store
            .insert_rate_snapshot(&ProviderId::combined(), &self.reference, date, &merged)
            .await
        {
            Ok(run_id) => {
                info!(run_id = %run_id, "Combined rates created");
                Some(SyncOutcome::Stored(run_id))
            }
            Err(e) => {
                error!(error = %e, "Storing combined rates failed");
                Some(SyncOutcome::Failed(e.to_string()))
            }
        }
    }
}
