//! Fixer (data.fixer.io) adapter.
//!
//! Fixer wraps every answer in a `success` envelope and needs an access key.
//! Without a key the adapter reports itself unavailable. The same key serves
//! both the latest-rates and the symbols endpoints.

use async_trait::async_trait;
use ratesync_common::{
    Currency, FetchOutcome, NormalizedSnapshot, NormalizedSymbolSet, ProviderId, Rates, Result,
    SyncError, Symbols,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::normalization::rebase;
use crate::provider::{decode, parse_date, RateSource, SymbolSource};
use crate::transport::Transport;

pub const LATEST_URL: &str = "http://data.fixer.io/api/latest";
pub const SYMBOLS_URL: &str = "http://data.fixer.io/api/symbols";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct LatestBody {
    base: Option<String>,
    date: Option<String>,
    #[serde(default)]
    rates: Rates,
}

#[derive(Debug, Deserialize)]
struct SymbolsBody {
    #[serde(default)]
    symbols: Symbols,
}

/// Fixer rate and symbol adapter.
pub struct FixerSource {
    id: ProviderId,
    api_key: Option<String>,
    reference: Currency,
}

impl FixerSource {
    /// Create the adapter. An empty or missing key disables it.
    pub fn new(api_key: Option<String>, reference: Currency) -> Self {
        Self {
            id: ProviderId::fixer(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            reference,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// GET `url` and unwrap the success envelope.
    async fn get_checked(&self, transport: &dyn Transport, url: &str, key: &str) -> Result<Value> {
        let body = transport
            .get_json(url, &[("access_key", key)])
            .await
            .map_err(|e| {
                error!(provider = %self.id, error = %e, "HTTP error fetching from Fixer");
                SyncError::from(e)
            })?;

        let envelope: Envelope = decode(&self.id, body.clone())?;
        if !envelope.success {
            let detail = envelope
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            error!(provider = %self.id, detail = %detail, "Fixer rejected request");
            return Err(SyncError::ProviderRejected {
                provider: self.id.clone(),
                detail,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl RateSource for FixerSource {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(&self, transport: &dyn Transport) -> Result<FetchOutcome<NormalizedSnapshot>> {
        let Some(key) = self.api_key.as_deref() else {
            warn!(provider = %self.id, "Fixer API key not configured, skipping fetch");
            return Ok(FetchOutcome::Unavailable);
        };

        info!(provider = %self.id, "Fetching rates from Fixer");
        let body = self.get_checked(transport, LATEST_URL, key).await?;
        let latest: LatestBody = decode(&self.id, body)?;

        let base = latest
            .base
            .map(Currency::new)
            .unwrap_or_else(|| self.reference.clone());
        let as_of_date = parse_date(&self.id, latest.date.as_deref())?;
        let rates = rebase(&base, &latest.rates, &self.reference)?;

        info!(
            provider = %self.id,
            base = %base,
            date = %as_of_date,
            num_rates = rates.len(),
            "Fetched Fixer rates"
        );

        Ok(FetchOutcome::Fetched(NormalizedSnapshot {
            provider: self.id.clone(),
            base_currency: self.reference.clone(),
            as_of_date,
            rates,
        }))
    }
}

#[async_trait]
impl SymbolSource for FixerSource {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch_symbols(
        &self,
        transport: &dyn Transport,
    ) -> Result<FetchOutcome<NormalizedSymbolSet>> {
        let Some(key) = self.api_key.as_deref() else {
            warn!(provider = %self.id, "Fixer API key not configured, skipping symbols fetch");
            return Ok(FetchOutcome::Unavailable);
        };

        info!(provider = %self.id, "Fetching currency symbols from Fixer");
        let body = self.get_checked(transport, SYMBOLS_URL, key).await?;
        let parsed: SymbolsBody = decode(&self.id, body)?;

        info!(provider = %self.id, num_symbols = parsed.symbols.len(), "Fetched Fixer symbols");

        Ok(FetchOutcome::Fetched(NormalizedSymbolSet {
            provider: self.id.clone(),
            symbols: parsed.symbols,
        }))
    }
}
