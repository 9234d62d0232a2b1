//! RateSync Server
//!
//! Keeps a store of exchange-rate snapshots current. Rates are pulled from
//! several providers, normalized to one reference currency, stored per
//! provider and merged into a `combined` snapshot. The stored data is served
//! over HTTP with conditional caching.

pub mod config;
pub mod sync_service;
pub mod state;
pub mod metrics;
pub mod caching;
pub mod error;
pub mod api;
pub mod scheduler;

pub use config::ServerConfig;
pub use sync_service::RatesSyncService;
pub use state::AppState;
pub use api::app_router;
