use crate::market::types::{EtfMetadata, PricePoint};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

/// Read-only market data the recommendation pipeline depends on. A provider
/// failure is a hard failure of the whole request; the calculations cannot
/// proceed meaningfully on partial data.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Static metadata for every tracked ETF.
    async fn etf_metadata(&self) -> Result<Vec<EtfMetadata>>;

    /// Daily closes for one symbol within the trailing lookback window,
    /// ascending by date.
    async fn price_history(&self, symbol: &str, lookback_days: i64) -> Result<Vec<PricePoint>>;

    /// Most recent close, if any history exists for the symbol.
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>>;
}

/// Provider backed by the Postgres price cache the worker keeps populated.
#[derive(Debug, Clone)]
pub struct PgMarketData {
    pool: sqlx::PgPool,
}

impl PgMarketData {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    fn window_start(lookback_days: i64) -> NaiveDate {
        Utc::now().date_naive() - chrono::Duration::days(lookback_days)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for PgMarketData {
    async fn etf_metadata(&self) -> Result<Vec<EtfMetadata>> {
        crate::storage::etfs::list_etfs(&self.pool).await
    }

    async fn price_history(&self, symbol: &str, lookback_days: i64) -> Result<Vec<PricePoint>> {
        let rows = sqlx::query_as::<_, (NaiveDate, f64)>(
            "SELECT date, close_price FROM etf_prices \
             WHERE symbol = $1 AND date >= $2 \
             ORDER BY date ASC",
        )
        .bind(symbol)
        .bind(Self::window_start(lookback_days))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select etf_prices failed for {symbol}"))?;

        Ok(rows
            .into_iter()
            .map(|(date, close_price)| PricePoint { date, close_price })
            .collect())
    }

    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        sqlx::query_scalar::<_, f64>(
            "SELECT close_price FROM etf_prices \
             WHERE symbol = $1 \
             ORDER BY date DESC \
             LIMIT 1",
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select latest close failed for {symbol}"))
    }
}
