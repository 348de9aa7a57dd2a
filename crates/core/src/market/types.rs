use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Static descriptive data for a tracked ETF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtfMetadata {
    pub symbol: String,
    pub name: String,
    pub expense_ratio: f64,
}

/// One daily close. Series are ordered ascending by date with no duplicate
/// dates per symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close_price: f64,
}

/// Per-ETF statistics derived from a trailing one-year price series.
/// Recomputed on every request; never cached across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtfMetrics {
    pub symbol: String,
    pub name: String,
    pub expense_ratio: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub one_year_return: f64,
}
