use crate::market::metrics::{self, DEFAULT_RISK_FREE_RATE};
use crate::market::provider::MarketDataProvider;
use crate::recommend::ONE_YEAR_DAYS;
use crate::time::us_market;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Calculated market snapshot for one tracked ETF, as served by the
/// market-data endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtfMarketRow {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub ytd_return: f64,
    pub expense_ratio: f64,
    pub one_year_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Price and performance metrics for every tracked ETF, ordered by symbol.
/// A missing latest price is reported as 0.0 rather than failing the row.
pub async fn market_overview(
    provider: &dyn MarketDataProvider,
    today: NaiveDate,
) -> Result<Vec<EtfMarketRow>> {
    let metadata = provider.etf_metadata().await?;
    let ytd_days = us_market::days_since_year_start(today);

    let mut rows = Vec::with_capacity(metadata.len());
    for etf in metadata {
        let price = provider.latest_price(&etf.symbol).await?.unwrap_or(0.0);
        let history_1yr = provider.price_history(&etf.symbol, ONE_YEAR_DAYS).await?;
        let history_ytd = provider.price_history(&etf.symbol, ytd_days).await?;

        rows.push(EtfMarketRow {
            ytd_return: metrics::ytd_return(price, &history_ytd),
            one_year_return: metrics::historical_return(&history_1yr),
            volatility: metrics::volatility(&history_1yr),
            sharpe_ratio: metrics::sharpe_ratio(&history_1yr, DEFAULT_RISK_FREE_RATE),
            price,
            symbol: etf.symbol,
            name: etf.name,
            expense_ratio: etf.expense_ratio,
        });
    }

    Ok(rows)
}
