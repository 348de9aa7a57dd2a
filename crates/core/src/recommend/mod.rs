pub mod allocation;
pub mod risk;
pub mod selector;
pub mod universe;

use crate::domain::portfolio::{PortfolioEntry, Recommendation};
use crate::domain::profile::Profile;
use crate::market::metrics::{self, DEFAULT_RISK_FREE_RATE};
use crate::market::provider::MarketDataProvider;
use crate::market::types::EtfMetrics;
use anyhow::Result;
use std::collections::BTreeMap;

/// Lookback window for the per-request metric computation and the chart
/// series attached to each entry.
pub const ONE_YEAR_DAYS: i64 = 365;

/// Full recommendation pipeline: risk score, blended allocation, per-category
/// ETF selection, portfolio assembly with dollar amounts and chart series,
/// and the allocation-weighted expected annual return.
///
/// Categories with no tracked candidate are silently omitted. Any provider
/// failure aborts the whole request.
pub async fn generate_recommendation(
    provider: &dyn MarketDataProvider,
    profile: &Profile,
) -> Result<Recommendation> {
    let score = risk::risk_score(profile);
    let target_allocation = allocation::blend_allocation(score);
    let all_metrics = fetch_all_etf_metrics(provider).await?;

    let mut portfolio = Vec::with_capacity(target_allocation.len());
    for (category, weight) in &target_allocation {
        let Some(best) =
            selector::best_etf_for_category(category, &all_metrics, profile.risk_tolerance)
        else {
            tracing::debug!(category, "no tracked candidate; omitting category");
            continue;
        };

        // Trailing-year series for frontend charting and the growth
        // simulation.
        let chart_data = provider.price_history(&best.symbol, ONE_YEAR_DAYS).await?;

        portfolio.push(PortfolioEntry {
            symbol: best.symbol.clone(),
            name: best.name.clone(),
            category: category.clone(),
            allocation_pct: (weight * 100.0).round() as i64,
            dollar_amount: metrics::round2(profile.investment_amount * weight),
            historical_data: chart_data,
        });
    }

    // Trailing one-year return as a proxy for expected future return.
    let expected_annual_return: f64 = portfolio
        .iter()
        .map(|entry| {
            let one_year = all_metrics
                .get(&entry.symbol)
                .map(|m| m.one_year_return)
                .unwrap_or(0.0);
            entry.allocation_pct as f64 / 100.0 * one_year
        })
        .sum();

    Ok(Recommendation {
        risk_score: metrics::round2(score),
        risk_tolerance: profile.risk_tolerance,
        expected_annual_return: metrics::round2(expected_annual_return),
        portfolio,
    })
}

/// Metrics for every tracked ETF, computed upfront from trailing-year
/// history so the selector never re-fetches per category. Keyed by symbol in
/// a BTreeMap to pin candidate iteration order.
pub async fn fetch_all_etf_metrics(
    provider: &dyn MarketDataProvider,
) -> Result<BTreeMap<String, EtfMetrics>> {
    let metadata = provider.etf_metadata().await?;

    let mut out = BTreeMap::new();
    for etf in metadata {
        let history = provider.price_history(&etf.symbol, ONE_YEAR_DAYS).await?;
        out.insert(
            etf.symbol.clone(),
            EtfMetrics {
                volatility: metrics::volatility(&history),
                sharpe_ratio: metrics::sharpe_ratio(&history, DEFAULT_RISK_FREE_RATE),
                one_year_return: metrics::historical_return(&history),
                symbol: etf.symbol,
                name: etf.name,
                expense_ratio: etf.expense_ratio,
            },
        );
    }
    Ok(out)
}
