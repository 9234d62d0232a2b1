//! Shared application state.

use std::sync::Arc;

use parking_lot::Mutex;
use ratesync_common::SyncReport;
use ratesync_store::SnapshotStore;
use tracing::warn;

use crate::config::ServerConfig;
use crate::metrics::{Metrics, SharedMetrics};
use crate::sync_service::RatesSyncService;

/// Operational state of the sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No sync is running.
    Idle,
    /// A sync is running.
    Running,
}

impl SyncState {
    /// Check if a new sync may start.
    pub fn accepts_runs(&self) -> bool {
        matches!(self, SyncState::Idle)
    }
}

/// Single-flight guard shared by the HTTP trigger and the scheduler.
///
/// The orchestrator itself does not exclude concurrent invocations; callers
/// take a [`SyncPermit`] first and back off when none is available.
#[derive(Debug, Clone)]
pub struct SyncGuard {
    state: Arc<Mutex<SyncState>>,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SyncState::Idle)),
        }
    }

    /// Claim the guard, or `None` if a sync is already running.
    pub fn try_acquire(&self) -> Option<SyncPermit> {
        let mut state = self.state.lock();
        if !state.accepts_runs() {
            return None;
        }
        *state = SyncState::Running;
        Some(SyncPermit {
            state: self.state.clone(),
        })
    }

    /// Current state.
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }
}

impl Default for SyncGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that the holder is the only running sync. Released on drop.
#[derive(Debug)]
pub struct SyncPermit {
    state: Arc<Mutex<SyncState>>,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        *self.state.lock() = SyncState::Idle;
    }
}

/// Everything the HTTP handlers and the scheduler share.
pub struct AppState {
    pub service: Arc<RatesSyncService>,
    pub store: Arc<dyn SnapshotStore>,
    pub guard: SyncGuard,
    pub metrics: SharedMetrics,
    /// Key required on manual sync triggers, if any.
    pub sync_api_key: Option<String>,
    /// Freshness window advertised on read responses.
    pub cache_ttl_secs: u64,
}

impl AppState {
    pub fn new(
        service: Arc<RatesSyncService>,
        store: Arc<dyn SnapshotStore>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            service,
            store,
            guard: SyncGuard::new(),
            metrics: Arc::new(Metrics::new()),
            sync_api_key: config.sync_api_key.clone(),
            cache_ttl_secs: config.sync.rates_ttl_secs(),
        }
    }

    /// Run one sync unless another is in flight.
    ///
    /// Returns `None` without syncing when the guard is already held.
    pub async fn run_sync(&self, force: bool) -> Option<SyncReport> {
        let Some(_permit) = self.guard.try_acquire() else {
            warn!(force, "Sync already in progress");
            self.metrics.sync_rejected();
            return None;
        };

        self.metrics.sync_started();
        let report = self.service.sync_all(force).await;
        self.metrics.sync_finished(&report);
        Some(report)
    }
}
