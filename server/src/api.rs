//! HTTP API.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

use ratesync_common::ProviderId;
use ratesync_protocol::{
    HealthResponse, LatestQuery, RatesResponse, SymbolsResponse, SyncQuery, SyncResponse,
};

use crate::caching::conditional_json;
use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Header carrying the manual sync key.
pub const API_KEY_HEADER: &str = "x-api-key";

// A blank `provider` parameter means the default.
fn requested_provider(raw: Option<String>, default: fn() -> ProviderId) -> ProviderId {
    raw.filter(|p| !p.trim().is_empty())
        .map(ProviderId::new)
        .unwrap_or_else(default)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn latest_rates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LatestQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let requested = requested_provider(query.provider, ProviderId::combined);
    info!(provider = %requested, "GET /rates/latest");

    let mut snapshot = state.store.query_latest_snapshot(&requested).await?;

    if snapshot.is_none() && requested.as_str() == ProviderId::COMBINED {
        debug!("Combined rates not found, trying fallback providers");
        for fallback in state.service.priority() {
            snapshot = state.store.query_latest_snapshot(fallback).await?;
            if snapshot.is_some() {
                info!(provider = %fallback, "Using fallback provider");
                break;
            }
        }
    }

    let Some(snapshot) = snapshot else {
        warn!(provider = %requested, "No rates available");
        return Err(ApiError::NotFound("No rates available".to_string()));
    };

    debug!(
        provider = %requested,
        date = %snapshot.as_of_date,
        num_rates = snapshot.rates.len(),
        "Returning rates"
    );
    conditional_json(
        &headers,
        &RatesResponse::from(snapshot),
        state.cache_ttl_secs,
        &state.metrics,
    )
}

async fn latest_symbols(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LatestQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let requested = requested_provider(query.provider, ProviderId::fixer);
    info!(provider = %requested, "GET /symbols/latest");

    let Some(set) = state.store.query_latest_symbol_set(&requested).await? else {
        warn!(provider = %requested, "No symbols available");
        return Err(ApiError::NotFound("No symbols available".to_string()));
    };

    conditional_json(
        &headers,
        &SymbolsResponse::from(set),
        state.cache_ttl_secs,
        &state.metrics,
    )
}

async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SyncQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<SyncResponse>> {
    if let Some(expected) = state.sync_api_key.as_deref() {
        let supplied = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
        if supplied != Some(expected) {
            warn!("Rejected sync trigger with missing or wrong API key");
            return Err(ApiError::Unauthorized);
        }
    }

    info!(force = query.force, "POST /jobs/sync triggered");
    let report = state
        .run_sync(query.force)
        .await
        .ok_or(ApiError::SyncInProgress)?;

    info!(results = report.len(), "Sync completed");
    Ok(Json(report))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Build the application router.
pub fn app_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rates/latest", get(latest_rates))
        .route("/symbols/latest", get(latest_symbols))
        .route("/jobs/sync", post(trigger_sync))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}
