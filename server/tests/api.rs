use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use ratesync_common::{Currency, ProviderId, Rates, Symbols};
use ratesync_fx::{fixer, frankfurter, StaticTransport};
use ratesync_server::{app_router, AppState, RatesSyncService, ServerConfig};
use ratesync_store::{MemoryStore, SnapshotStore};

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    transport: Arc<StaticTransport>,
    state: Arc<AppState>,
}

fn build_app(config: ServerConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(StaticTransport::new());
    let service = RatesSyncService::with_default_sources(
        store.clone(),
        transport.clone(),
        config.fixer_api_key.clone(),
        &config.sync,
    );
    let state = Arc::new(AppState::new(Arc::new(service), store.clone(), &config));

    TestApp {
        router: app_router(state.clone(), &config),
        store,
        transport,
        state,
    }
}

fn default_app() -> TestApp {
    build_app(ServerConfig::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_rates(store: &MemoryStore, provider: ProviderId, pairs: &[(&str, f64)]) {
    let rates: Rates = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    store
        .insert_rate_snapshot(
            &provider,
            &Currency::eur(),
            NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
            &rates,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn health_is_ok() {
    let app = default_app();

    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn latest_rates_without_data_is_404() {
    let app = default_app();

    let response = app.router.oneshot(get("/rates/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"detail": "No rates available"}));
}

#[tokio::test]
async fn latest_rates_prefers_combined() {
    let app = default_app();
    seed_rates(&app.store, ProviderId::fixer(), &[("EUR", 1.0), ("USD", 1.08)]).await;
    seed_rates(&app.store, ProviderId::combined(), &[("EUR", 1.0), ("JPY", 161.0)]).await;

    let response = app.router.oneshot(get("/rates/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["base"], "EUR");
    assert_eq!(body["date"], "2024-02-05");
    assert_eq!(body["rates"], json!({"EUR": 1.0, "JPY": 161.0}));
    assert!(body["fetched_at"].is_string());
}

#[tokio::test]
async fn latest_rates_falls_back_in_priority_order() {
    let app = default_app();
    seed_rates(&app.store, ProviderId::frankfurter(), &[("EUR", 1.0), ("GBP", 0.85)]).await;

    let response = app.router.oneshot(get("/rates/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["rates"], json!({"EUR": 1.0, "GBP": 0.85}));
}

#[tokio::test]
async fn blank_provider_means_default() {
    let app = default_app();
    seed_rates(&app.store, ProviderId::combined(), &[("EUR", 1.0), ("JPY", 161.0)]).await;
    let symbols: Symbols = [("EUR".to_string(), "Euro".to_string())].into_iter().collect();
    app.store
        .insert_symbol_set(&ProviderId::fixer(), &symbols)
        .await
        .unwrap();

    let rates = app
        .router
        .clone()
        .oneshot(get("/rates/latest?provider="))
        .await
        .unwrap();
    assert_eq!(rates.status(), StatusCode::OK);
    assert_eq!(body_json(rates).await["rates"], json!({"EUR": 1.0, "JPY": 161.0}));

    let symbols = app
        .router
        .oneshot(get("/symbols/latest?provider=%20"))
        .await
        .unwrap();
    assert_eq!(symbols.status(), StatusCode::OK);
    assert_eq!(body_json(symbols).await["provider"], "fixer");
}

#[tokio::test]
async fn explicit_provider_does_not_fall_back() {
    let app = default_app();
    seed_rates(&app.store, ProviderId::frankfurter(), &[("EUR", 1.0)]).await;

    let response = app
        .router
        .oneshot(get("/rates/latest?provider=fixer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn matching_etag_gets_304_with_cache_headers() {
    let app = default_app();
    seed_rates(&app.store, ProviderId::combined(), &[("EUR", 1.0), ("USD", 1.08)]).await;

    let first = app.router.clone().oneshot(get("/rates/latest")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let etag = first.headers().get(header::ETAG).unwrap().clone();
    assert_eq!(
        first.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=86400, s-maxage=86400, stale-while-revalidate=86400, stale-if-error=86400"
    );

    let conditional = Request::builder()
        .uri("/rates/latest")
        .header(header::IF_NONE_MATCH, etag.clone())
        .body(Body::empty())
        .unwrap();
    let second = app.router.oneshot(conditional).await.unwrap();

    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers().get(header::ETAG), Some(&etag));
    assert!(second.headers().contains_key(header::CACHE_CONTROL));
    let bytes = to_bytes(second.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());

    let metrics = app.state.metrics.snapshot();
    assert_eq!(metrics.responses_full, 1);
    assert_eq!(metrics.responses_not_modified, 1);
}

#[tokio::test]
async fn latest_symbols_defaults_to_fixer() {
    let app = default_app();
    let symbols: Symbols = [("EUR".to_string(), "Euro".to_string())].into_iter().collect();
    app.store
        .insert_symbol_set(&ProviderId::fixer(), &symbols)
        .await
        .unwrap();

    let response = app.router.clone().oneshot(get("/symbols/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::ETAG));
    assert_eq!(
        body_json(response).await,
        json!({"provider": "fixer", "symbols": {"EUR": "Euro"}})
    );

    let missing = app
        .router
        .oneshot(get("/symbols/latest?provider=frankfurter"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn forced_sync_returns_provider_outcomes() {
    let mut config = ServerConfig::default();
    config.fixer_api_key = Some("key".to_string());
    let app = build_app(config);

    app.transport.respond(
        fixer::LATEST_URL,
        json!({"success": true, "base": "EUR", "date": "2024-02-04", "rates": {"USD": 1.08}}),
    );
    app.transport.respond(
        frankfurter::LATEST_URL,
        json!({"base": "EUR", "date": "2024-02-05", "rates": {"JPY": 161.0}}),
    );
    app.transport.respond(
        fixer::SYMBOLS_URL,
        json!({"success": true, "symbols": {"EUR": "Euro"}}),
    );

    let response = app
        .router
        .clone()
        .oneshot(post("/jobs/sync?force=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let providers = body["providers"].as_object().unwrap();
    for key in ["fixer", "frankfurter", "combined", "symbols"] {
        assert!(providers[key]["run_id"].is_string(), "{key}: {body}");
    }

    let rates = app.router.oneshot(get("/rates/latest")).await.unwrap();
    let rates = body_json(rates).await;
    assert_eq!(rates["date"], "2024-02-05");
    assert_eq!(rates["rates"], json!({"EUR": 1.0, "USD": 1.08, "JPY": 161.0}));
}

#[tokio::test]
async fn sync_requires_api_key_when_configured() {
    let mut config = ServerConfig::default();
    config.sync_api_key = Some("s3cret".to_string());
    let app = build_app(config);

    let denied = app.router.clone().oneshot(post("/jobs/sync")).await.unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(denied).await, json!({"detail": "Unauthorized"}));

    let wrong = Request::builder()
        .method(Method::POST)
        .uri("/jobs/sync")
        .header("X-API-Key", "guess")
        .body(Body::empty())
        .unwrap();
    let wrong = app.router.clone().oneshot(wrong).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let allowed = Request::builder()
        .method(Method::POST)
        .uri("/jobs/sync")
        .header("X-API-Key", "s3cret")
        .body(Body::empty())
        .unwrap();
    let allowed = app.router.oneshot(allowed).await.unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(app.transport.total_calls(), 1);
}

#[tokio::test]
async fn overlapping_sync_is_rejected() {
    let app = default_app();
    let _held = app.state.guard.try_acquire().unwrap();

    let response = app.router.oneshot(post("/jobs/sync")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(app.transport.total_calls(), 0);
}

#[tokio::test]
async fn metrics_are_exposed() {
    let app = default_app();
    app.router.clone().oneshot(post("/jobs/sync")).await.unwrap();

    let response = app.router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("ratesync_syncs_total 1"));
}
