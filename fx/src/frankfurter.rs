//! Frankfurter (api.frankfurter.dev) adapter. Keyless, always enabled.

use async_trait::async_trait;
use ratesync_common::{Currency, FetchOutcome, NormalizedSnapshot, ProviderId, Rates, Result};
use serde::Deserialize;
use tracing::{error, info};

use crate::normalization::rebase;
use crate::provider::{decode, parse_date, RateSource};
use crate::transport::Transport;

pub const LATEST_URL: &str = "https://api.frankfurter.dev/v1/latest";

#[derive(Debug, Deserialize)]
struct LatestBody {
    date: Option<String>,
    #[serde(default)]
    rates: Rates,
}

/// Frankfurter rate adapter.
pub struct FrankfurterSource {
    id: ProviderId,
    reference: Currency,
}

impl FrankfurterSource {
    pub fn new(reference: Currency) -> Self {
        Self {
            id: ProviderId::frankfurter(),
            reference,
        }
    }
}

#[async_trait]
impl RateSource for FrankfurterSource {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(&self, transport: &dyn Transport) -> Result<FetchOutcome<NormalizedSnapshot>> {
        info!(provider = %self.id, "Fetching rates from Frankfurter");

        // Rates are requested against the reference currency directly.
        let body = transport
            .get_json(LATEST_URL, &[("base", self.reference.code())])
            .await
            .map_err(|e| {
                error!(provider = %self.id, error = %e, "HTTP error fetching from Frankfurter");
                e
            })?;

        let latest: LatestBody = decode(&self.id, body)?;
        let as_of_date = parse_date(&self.id, latest.date.as_deref())?;
        let rates = rebase(&self.reference, &latest.rates, &self.reference)?;

        info!(
            provider = %self.id,
            date = %as_of_date,
            num_rates = rates.len(),
            "Fetched Frankfurter rates"
        );

        Ok(FetchOutcome::Fetched(NormalizedSnapshot {
            provider: self.id.clone(),
            base_currency: self.reference.clone(),
            as_of_date,
            rates,
        }))
    }
}
