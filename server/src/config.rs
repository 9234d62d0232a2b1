//! Server configuration.

use std::time::Duration;

use ratesync_common::time::constants;
use ratesync_common::{Currency, ProviderId};

const SECS_PER_HOUR: u64 = 60 * 60;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Sync cadence and cache windows.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Hours between scheduled syncs; also the rate TTL.
    pub interval_hours: u64,
    /// Hours a stored symbol set stays fresh.
    pub symbols_cache_hours: u64,
    /// Providers in merge priority order.
    pub provider_priority: Vec<ProviderId>,
    /// Currency every rate is normalized against.
    pub reference_currency: Currency,
    /// Per-request timeout for provider calls.
    pub fetch_timeout: Duration,
    /// Run the periodic sync task.
    pub scheduler_enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_hours: constants::default_sync_interval().num_hours().unsigned_abs(),
            symbols_cache_hours: constants::default_symbols_ttl().num_hours().unsigned_abs(),
            provider_priority: vec![ProviderId::fixer(), ProviderId::frankfurter()],
            reference_currency: Currency::eur(),
            fetch_timeout: Duration::from_secs(
                constants::default_fetch_timeout().num_seconds().unsigned_abs(),
            ),
            scheduler_enabled: true,
        }
    }
}

impl SyncConfig {
    /// Rate freshness window in seconds.
    pub fn rates_ttl_secs(&self) -> u64 {
        self.interval_hours.saturating_mul(SECS_PER_HOUR)
    }

    /// Symbol freshness window in seconds.
    pub fn symbols_ttl_secs(&self) -> u64 {
        self.symbols_cache_hours.saturating_mul(SECS_PER_HOUR)
    }

    /// Period of the scheduled sync.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.rates_ttl_secs())
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Fixer access key; Fixer is disabled when absent.
    pub fixer_api_key: Option<String>,
    /// Key required on `POST /jobs/sync` when set.
    pub sync_api_key: Option<String>,
    /// Allowed CORS origins; `*` allows any.
    pub allow_origins: Vec<String>,
    /// Sync configuration.
    pub sync: SyncConfig,
    /// Logging configuration.
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8000,
            database_url: None,
            fixer_api_key: None,
            sync_api_key: None,
            allow_origins: vec!["*".to_string()],
            sync: SyncConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Split a comma list, trimming entries and dropping empty ones.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first when present.
    /// Unparsable numbers keep their defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        config.database_url = lookup("DATABASE_URL").and_then(non_empty);
        config.fixer_api_key = lookup("FIXER_API_KEY").and_then(non_empty);
        config.sync_api_key = lookup("SYNC_API_KEY").and_then(non_empty);

        if let Some(origins) = lookup("ALLOW_ORIGINS") {
            config.allow_origins = split_list(&origins);
        }

        if let Some(hours) = lookup("SYNC_INTERVAL_HOURS") {
            if let Ok(hours) = hours.trim().parse() {
                config.sync.interval_hours = hours;
            }
        }

        if let Some(hours) = lookup("SYMBOLS_CACHE_HOURS") {
            if let Ok(hours) = hours.trim().parse() {
                config.sync.symbols_cache_hours = hours;
            }
        }

        if let Some(priority) = lookup("PROVIDER_PRIORITY") {
            config.sync.provider_priority =
                split_list(&priority).into_iter().map(ProviderId::new).collect();
        }

        if let Some(currency) = lookup("REFERENCE_CURRENCY") {
            config.sync.reference_currency = Currency::new(currency.trim());
        }

        if let Some(secs) = lookup("FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.trim().parse() {
                config.sync.fetch_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(enabled) = lookup("ENABLE_SCHEDULER").as_deref().and_then(parse_bool) {
            config.sync.scheduler_enabled = enabled;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log.level = level.to_lowercase();
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            config.log.json = format.eq_ignore_ascii_case("json");
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.sync.interval_hours == 0 {
            return Err("Sync interval must be at least one hour".to_string());
        }

        if self.sync.symbols_cache_hours == 0 {
            return Err("Symbols cache window must be at least one hour".to_string());
        }

        if self.sync.provider_priority.is_empty() {
            return Err("Provider priority list cannot be empty".to_string());
        }

        if let Some(bad) = self.sync.provider_priority.iter().find(|p| !p.is_valid()) {
            return Err(format!("Invalid provider id in priority list: {:?}", bad.as_str()));
        }

        if !self.sync.reference_currency.is_valid() {
            return Err(format!(
                "Reference currency must be a three-letter code, got {:?}",
                self.sync.reference_currency.code()
            ));
        }

        if self.sync.fetch_timeout.is_zero() {
            return Err("Fetch timeout cannot be 0".to_string());
        }

        Ok(())
    }

    /// Whether CORS should allow any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.allow_origins.is_empty() || self.allow_origins.iter().any(|o| o == "*")
    }
}
