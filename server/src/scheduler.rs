//! Background scheduler for periodic rate sync.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::state::AppState;

/// Delay before the first scheduled sync, to let the server finish starting.
const INITIAL_DELAY_SECS: u64 = 30;

/// Start the periodic sync task.
pub fn start_sync_scheduler(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "Sync scheduler started");

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        // First tick is immediate, later ticks are `period` apart.
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            run_scheduled_sync(&state).await;
        }
    })
}

/// Run a single non-forced sync, skipping it if one is already running.
pub async fn run_scheduled_sync(state: &AppState) -> bool {
    info!("Running scheduled sync");

    match state.run_sync(false).await {
        Some(report) => {
            let (stored, skipped, failed) = report.tally();
            info!(stored, skipped, failed, "Scheduled sync completed");
            true
        }
        None => {
            warn!("Scheduled sync skipped: a sync is already running");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::sync_service::RatesSyncService;
    use ratesync_fx::{frankfurter, StaticTransport};
    use ratesync_store::MemoryStore;
    use serde_json::json;

    fn app_state(transport: Arc<StaticTransport>) -> AppState {
        let config = ServerConfig::default();
        let store = Arc::new(MemoryStore::new());
        let service =
            RatesSyncService::with_default_sources(store.clone(), transport, None, &config.sync);
        AppState::new(Arc::new(service), store, &config)
    }

    #[tokio::test]
    async fn test_scheduled_sync_is_not_forced() {
        let transport = Arc::new(StaticTransport::new());
        transport.respond(
            frankfurter::LATEST_URL,
            json!({"date": "2024-02-05", "rates": {"USD": 1.09}}),
        );
        let state = app_state(transport.clone());

        assert!(run_scheduled_sync(&state).await);
        assert!(run_scheduled_sync(&state).await);

        // second run found the stored snapshot fresh
        assert_eq!(transport.calls(frankfurter::LATEST_URL), 1);
    }

    #[tokio::test]
    async fn test_scheduled_sync_skips_while_running() {
        let state = app_state(Arc::new(StaticTransport::new()));

        let _held = state.guard.try_acquire().unwrap();
        assert!(!run_scheduled_sync(&state).await);
        assert_eq!(state.metrics.snapshot().syncs_total, 0);
    }
}
