//! RateSync Server Binary
//!
//! Runs the periodic rate sync and serves the HTTP API.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ratesync_fx::HttpTransport;
use ratesync_server::config::LogConfig;
use ratesync_server::scheduler::start_sync_scheduler;
use ratesync_server::{app_router, AppState, RatesSyncService, ServerConfig};
use ratesync_store::{MemoryStore, PgStore, SnapshotStore};

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry.with(fmt::layer().json().with_current_span(false)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn SnapshotStore>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            store.migrate().await?;
            info!("Connected to PostgreSQL store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    init_tracing(&config.log);

    info!("Starting RateSync");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    if config.fixer_api_key.is_none() {
        warn!("FIXER_API_KEY not set, Fixer rates and symbols are disabled");
    }

    let store = open_store(&config).await?;
    let transport = Arc::new(HttpTransport::new(config.sync.fetch_timeout)?);
    let service = RatesSyncService::with_default_sources(
        store.clone(),
        transport,
        config.fixer_api_key.clone(),
        &config.sync,
    );

    info!(
        providers = ?service.rate_providers(),
        priority = ?service.priority(),
        reference = %service.reference(),
        "Sync service configured"
    );

    let state = Arc::new(AppState::new(Arc::new(service), store, &config));

    if config.sync.scheduler_enabled {
        start_sync_scheduler(state.clone(), config.sync.interval());
    } else {
        info!("Scheduler disabled by configuration");
    }

    let router = app_router(state, &config);
    let bind_addr = format!("{}:{}", config.listen_addr, config.listen_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!(listen_addr = %bind_addr, "RateSync running");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("RateSync shutdown complete");
    Ok(())
}
