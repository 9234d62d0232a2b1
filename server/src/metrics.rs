//! Metrics collection for sync and API monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ratesync_common::SyncReport;

/// Service metrics.
pub struct Metrics {
    /// Sync cycles run.
    pub syncs_total: AtomicU64,
    /// Syncs currently running.
    pub syncs_active: AtomicU64,
    /// Sync triggers rejected because one was already running.
    pub syncs_rejected: AtomicU64,
    /// Per-provider results that stored a row.
    pub outcomes_stored: AtomicU64,
    /// Per-provider results skipped as fresh.
    pub outcomes_skipped: AtomicU64,
    /// Per-provider results that failed.
    pub outcomes_failed: AtomicU64,
    /// Read responses answered with 304.
    pub responses_not_modified: AtomicU64,
    /// Read responses answered with a full body.
    pub responses_full: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            syncs_total: AtomicU64::new(0),
            syncs_active: AtomicU64::new(0),
            syncs_rejected: AtomicU64::new(0),
            outcomes_stored: AtomicU64::new(0),
            outcomes_skipped: AtomicU64::new(0),
            outcomes_failed: AtomicU64::new(0),
            responses_not_modified: AtomicU64::new(0),
            responses_full: AtomicU64::new(0),
        }
    }

    /// Record a sync starting.
    pub fn sync_started(&self) {
        self.syncs_total.fetch_add(1, Ordering::Relaxed);
        self.syncs_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sync finishing with `report`.
    pub fn sync_finished(&self, report: &SyncReport) {
        let (stored, skipped, failed) = report.tally();
        self.outcomes_stored.fetch_add(stored as u64, Ordering::Relaxed);
        self.outcomes_skipped.fetch_add(skipped as u64, Ordering::Relaxed);
        self.outcomes_failed.fetch_add(failed as u64, Ordering::Relaxed);
        self.syncs_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a trigger turned away by the single-flight guard.
    pub fn sync_rejected(&self) {
        self.syncs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a 304 response.
    pub fn not_modified(&self) {
        self.responses_not_modified.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a full-body read response.
    pub fn full_response(&self) {
        self.responses_full.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            syncs_total: self.syncs_total.load(Ordering::Relaxed),
            syncs_active: self.syncs_active.load(Ordering::Relaxed),
            syncs_rejected: self.syncs_rejected.load(Ordering::Relaxed),
            outcomes_stored: self.outcomes_stored.load(Ordering::Relaxed),
            outcomes_skipped: self.outcomes_skipped.load(Ordering::Relaxed),
            outcomes_failed: self.outcomes_failed.load(Ordering::Relaxed),
            responses_not_modified: self.responses_not_modified.load(Ordering::Relaxed),
            responses_full: self.responses_full.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP ratesync_syncs_total Total number of sync cycles
# TYPE ratesync_syncs_total counter
ratesync_syncs_total {}

# HELP ratesync_syncs_active Sync cycles currently running
# TYPE ratesync_syncs_active gauge
ratesync_syncs_active {}

# HELP ratesync_syncs_rejected Sync triggers rejected while a sync was running
# TYPE ratesync_syncs_rejected counter
ratesync_syncs_rejected {}

# HELP ratesync_outcomes_total Per-provider sync results by outcome
# TYPE ratesync_outcomes_total counter
ratesync_outcomes_total{{outcome="stored"}} {}
ratesync_outcomes_total{{outcome="skipped"}} {}
ratesync_outcomes_total{{outcome="failed"}} {}

# HELP ratesync_responses_total Read responses by kind
# TYPE ratesync_responses_total counter
ratesync_responses_total{{kind="not_modified"}} {}
ratesync_responses_total{{kind="full"}} {}
"#,
            snapshot.syncs_total,
            snapshot.syncs_active,
            snapshot.syncs_rejected,
            snapshot.outcomes_stored,
            snapshot.outcomes_skipped,
            snapshot.outcomes_failed,
            snapshot.responses_not_modified,
            snapshot.responses_full,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub syncs_total: u64,
    pub syncs_active: u64,
    pub syncs_rejected: u64,
    pub outcomes_stored: u64,
    pub outcomes_skipped: u64,
    pub outcomes_failed: u64,
    pub responses_not_modified: u64,
    pub responses_full: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;
