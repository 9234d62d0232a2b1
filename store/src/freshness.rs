//! Freshness checks against the latest stored row.

use std::sync::Arc;

use chrono::Duration;
use ratesync_common::{is_within_ttl, now, parse_timestamp, ProviderId, Result, Timestamp};
use tracing::{debug, warn};

use crate::store::SnapshotStore;

/// Upper bound on a configured TTL (100 years).
const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Which kind of stored row a freshness check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Rates,
    Symbols,
}

/// Answers whether a provider's latest stored row is still within its TTL.
///
/// Nothing is cached in process: every check reads the store again.
#[derive(Clone)]
pub struct FreshnessOracle {
    store: Arc<dyn SnapshotStore>,
    kind: RecordKind,
    ttl: Duration,
}

impl FreshnessOracle {
    /// Create an oracle for `kind` rows with a TTL of `ttl_secs` seconds.
    pub fn new(store: Arc<dyn SnapshotStore>, kind: RecordKind, ttl_secs: u64) -> Self {
        Self {
            store,
            kind,
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    /// Whether `provider`'s latest row is fresh right now.
    pub async fn is_fresh(&self, provider: &ProviderId) -> bool {
        self.is_fresh_at(provider, now()).await
    }

    /// Whether `provider`'s latest row is fresh at `now`.
    ///
    /// Missing rows, unparsable timestamps and store read failures all count
    /// as stale.
    pub async fn is_fresh_at(&self, provider: &ProviderId, now: Timestamp) -> bool {
        let fetched_at = match self.latest_fetched_at(provider).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(provider = %provider, kind = ?self.kind, "No cached data");
                return false;
            }
            Err(e) => {
                warn!(provider = %provider, kind = ?self.kind, error = %e, "Freshness lookup failed");
                return false;
            }
        };

        let Some(fetched_at) = parse_timestamp(&fetched_at) else {
            warn!(
                provider = %provider,
                kind = ?self.kind,
                fetched_at = %fetched_at,
                "Invalid stored timestamp"
            );
            return false;
        };

        let fresh = is_within_ttl(fetched_at, now, self.ttl);
        debug!(
            provider = %provider,
            kind = ?self.kind,
            age_secs = now.signed_duration_since(fetched_at).num_seconds(),
            ttl_secs = self.ttl.num_seconds(),
            fresh,
            "Freshness check"
        );
        fresh
    }

    async fn latest_fetched_at(&self, provider: &ProviderId) -> Result<Option<String>> {
        Ok(match self.kind {
            RecordKind::Rates => self
                .store
                .query_latest_snapshot(provider)
                .await?
                .map(|s| s.fetched_at),
            RecordKind::Symbols => self
                .store
                .query_latest_symbol_set(provider)
                .await?
                .map(|s| s.fetched_at),
        })
    }
}
