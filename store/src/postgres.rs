//! PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ratesync_common::{
    format_timestamp, now, Currency, ProviderId, RateSnapshot, Rates, Result, RunId, SyncError,
    SymbolSet, Symbols,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::store::SnapshotStore;

/// Maximum pooled connections.
const MAX_CONNECTIONS: u32 = 5;

fn persistence(err: impl std::fmt::Display) -> SyncError {
    SyncError::Persistence(err.to_string())
}

/// Store backed by the `rates_runs`, `rates_entries` and `symbols_runs` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(persistence)?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(persistence)?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for PgStore {
    #[instrument(
        skip(self, provider, base, rates),
        fields(provider = %provider, num_rates = rates.len())
    )]
    async fn insert_rate_snapshot(
        &self,
        provider: &ProviderId,
        base: &Currency,
        date: NaiveDate,
        rates: &Rates,
    ) -> Result<RunId> {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO rates_runs (id, provider, base, date, fetched_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(*RunId::new().as_uuid())
        .bind(provider.as_str())
        .bind(base.code())
        .bind(date)
        .bind(now())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        let Some((id,)) = inserted else {
            error!(provider = %provider, "Failed to insert rates run");
            return Err(SyncError::Persistence("Failed to insert rates run".to_string()));
        };

        if !rates.is_empty() {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO rates_entries (run_id, currency, rate) ");
            builder.push_values(rates.iter(), |mut row, (currency, rate)| {
                row.push_bind(id).push_bind(currency.as_str()).push_bind(*rate);
            });
            builder
                .build()
                .execute(&self.pool)
                .await
                .map_err(persistence)?;
            debug!(run_id = %id, entries = rates.len(), "Stored rate entries");
        }

        info!(run_id = %id, provider = %provider, "Stored rates run");
        Ok(RunId::from_uuid(id))
    }

    async fn query_latest_snapshot(&self, provider: &ProviderId) -> Result<Option<RateSnapshot>> {
        let run: Option<(Uuid, String, String, NaiveDate, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, provider, base, date, fetched_at FROM rates_runs \
             WHERE provider = $1 ORDER BY fetched_at DESC LIMIT 1",
        )
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        let Some((id, provider_name, base, date, fetched_at)) = run else {
            debug!(provider = %provider, "No rates found");
            return Ok(None);
        };

        let entries: Vec<(String, f64)> =
            sqlx::query_as("SELECT currency, rate FROM rates_entries WHERE run_id = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await
                .map_err(persistence)?;

        Ok(Some(RateSnapshot {
            id: RunId::from_uuid(id),
            provider: ProviderId::new(provider_name),
            base_currency: Currency::new(base),
            as_of_date: date,
            fetched_at: format_timestamp(fetched_at),
            rates: entries.into_iter().collect(),
        }))
    }

    #[instrument(
        skip(self, provider, symbols),
        fields(provider = %provider, num_symbols = symbols.len())
    )]
    async fn insert_symbol_set(&self, provider: &ProviderId, symbols: &Symbols) -> Result<RunId> {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO symbols_runs (id, provider, symbols, fetched_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(*RunId::new().as_uuid())
        .bind(provider.as_str())
        .bind(Json(symbols))
        .bind(now())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        match inserted {
            Some((id,)) => {
                info!(run_id = %id, provider = %provider, "Stored symbols");
                Ok(RunId::from_uuid(id))
            }
            None => {
                error!(provider = %provider, "Failed to insert symbols run");
                Err(SyncError::Persistence("Failed to insert symbols run".to_string()))
            }
        }
    }

    async fn query_latest_symbol_set(&self, provider: &ProviderId) -> Result<Option<SymbolSet>> {
        let row: Option<(Uuid, String, DateTime<Utc>, Json<Symbols>)> = sqlx::query_as(
            "SELECT id, provider, fetched_at, symbols FROM symbols_runs \
             WHERE provider = $1 ORDER BY fetched_at DESC LIMIT 1",
        )
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(|(id, provider_name, fetched_at, Json(symbols))| SymbolSet {
            id: RunId::from_uuid(id),
            provider: ProviderId::new(provider_name),
            fetched_at: format_timestamp(fetched_at),
            symbols,
        }))
    }
}
