use crate::domain::profile::RiskTolerance;
use crate::market::types::PricePoint;
use serde::{Deserialize, Serialize};

/// One position in the recommended portfolio. `allocation_pct` is rounded
/// per entry, so the percentages across a portfolio need not sum to exactly
/// 100; downstream consumers rely on this and it must not be redistributed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub allocation_pct: i64,
    pub dollar_amount: f64,
    pub historical_data: Vec<PricePoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub risk_score: f64,
    pub risk_tolerance: RiskTolerance,
    pub expected_annual_return: f64,
    pub portfolio: Vec<PortfolioEntry>,
}

/// Projected portfolio value at a reporting year. Conservative, expected and
/// optimistic track the 10th/50th/90th percentile of simulated outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub year: u32,
    pub conservative: f64,
    pub expected: f64,
    pub optimistic: f64,
}
