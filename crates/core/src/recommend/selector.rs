use crate::domain::profile::RiskTolerance;
use crate::market::types::EtfMetrics;
use crate::recommend::universe;
use std::collections::BTreeMap;

/// Weighted-score coefficients for ranking candidate ETFs. Volatility and
/// expense carry negative weights: lower is better.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub sharpe: f64,
    pub volatility: f64,
    pub expense: f64,
}

impl ScoringWeights {
    pub fn for_tolerance(tolerance: RiskTolerance) -> Self {
        match tolerance {
            RiskTolerance::Conservative => Self {
                sharpe: 0.6,
                volatility: -0.3,
                expense: -0.1,
            },
            RiskTolerance::Aggressive => Self {
                sharpe: 0.8,
                volatility: -0.1,
                expense: -0.1,
            },
            RiskTolerance::Moderate => Self {
                sharpe: 0.7,
                volatility: -0.2,
                expense: -0.1,
            },
        }
    }

    pub fn score(&self, metrics: &EtfMetrics) -> f64 {
        metrics.sharpe_ratio * self.sharpe
            + metrics.volatility * self.volatility
            + metrics.expense_ratio * self.expense
    }
}

/// Highest-scoring tracked ETF within the category's symbol universe, or
/// None when no tracked symbol belongs to the category.
///
/// Candidates are visited in symbol order (the metrics map is a BTreeMap),
/// and only a strictly greater score displaces the leader, so ties resolve
/// to the alphabetically first symbol deterministically.
pub fn best_etf_for_category<'a>(
    category: &str,
    all_metrics: &'a BTreeMap<String, EtfMetrics>,
    tolerance: RiskTolerance,
) -> Option<&'a EtfMetrics> {
    let eligible = universe::category_symbols(category);
    let weights = ScoringWeights::for_tolerance(tolerance);

    let mut best: Option<(&EtfMetrics, f64)> = None;
    for (symbol, metrics) in all_metrics {
        if !eligible.contains(&symbol.as_str()) {
            continue;
        }
        let score = weights.score(metrics);
        match best {
            Some((_, max_score)) if score <= max_score => {}
            _ => best = Some((metrics, score)),
        }
    }

    best.map(|(metrics, _)| metrics)
}
