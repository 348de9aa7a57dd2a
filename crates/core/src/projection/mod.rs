//! Monte Carlo growth projection for an assembled portfolio.
//!
//! The portfolio is reduced to a single (annual return, annual volatility)
//! pair from five years of history, then compounded year by year under
//! normally distributed annual returns. Reporting years other than the
//! terminal one are derived from the terminal distribution's implied
//! compound growth rate; intermediate years are not sampled independently.
//! That approximation is part of the output contract and must not be
//! replaced with per-year sampling.

use crate::domain::portfolio::{PortfolioEntry, Projection};
use crate::market::metrics;
use crate::market::provider::MarketDataProvider;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::cmp::Ordering;

pub const DEFAULT_YEARS: u32 = 20;
pub const DEFAULT_SIMULATIONS: usize = 500;
pub const CHECKPOINT_YEARS: [u32; 4] = [5, 10, 15, 20];

const HISTORY_YEARS: i64 = 5;

/// Source of randomized annual returns. Injectable so tests can substitute
/// a seeded or constant generator.
pub trait ReturnSampler {
    fn sample(&mut self, mean: f64, std_dev: f64) -> f64;
}

/// Production sampler drawing from Normal(mean, std_dev).
pub struct NormalSampler<R: Rng> {
    rng: R,
}

impl NormalSampler<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> ReturnSampler for NormalSampler<R> {
    fn sample(&mut self, mean: f64, std_dev: f64) -> f64 {
        // A zero-volatility portfolio degenerates to its mean return.
        match Normal::new(mean, std_dev) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }
}

/// Allocation-weighted annual return and volatility, both as fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioStats {
    pub annual_return: f64,
    pub annual_volatility: f64,
}

/// Statistical profile of the whole portfolio from five years of history.
/// The five-year return is averaged (divided by 5, not compounded) to get a
/// stable annual figure that is less sensitive to short-term anomalies.
pub async fn portfolio_stats(
    provider: &dyn MarketDataProvider,
    portfolio: &[PortfolioEntry],
) -> Result<PortfolioStats> {
    let mut annual_return = 0.0;
    let mut annual_volatility = 0.0;

    for entry in portfolio {
        let history = provider
            .price_history(&entry.symbol, HISTORY_YEARS * 365)
            .await?;

        let entry_return = metrics::historical_return(&history) / HISTORY_YEARS as f64;
        let entry_volatility = metrics::volatility(&history);

        let allocation = entry.allocation_pct as f64 / 100.0;
        annual_return += allocation * (entry_return / 100.0);
        annual_volatility += allocation * (entry_volatility / 100.0);
    }

    Ok(PortfolioStats {
        annual_return,
        annual_volatility,
    })
}

/// Runs the simulation and reports percentile scenarios at the checkpoint
/// years. Conservative/expected/optimistic are the 10th/50th/90th
/// percentiles of terminal values, so conservative <= expected <= optimistic
/// holds for every reported year.
pub fn simulate(
    stats: PortfolioStats,
    initial_investment: f64,
    years: u32,
    simulations: usize,
    sampler: &mut dyn ReturnSampler,
) -> Vec<Projection> {
    let mut final_values = Vec::with_capacity(simulations);
    for _ in 0..simulations {
        let mut value = initial_investment;
        for _ in 0..years {
            let annual_return = sampler.sample(stats.annual_return, stats.annual_volatility);
            value *= 1.0 + annual_return;
        }
        final_values.push(value);
    }
    final_values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let conservative_rate = implied_annual_rate(percentile(&final_values, 10.0), initial_investment, years);
    let expected_rate = implied_annual_rate(percentile(&final_values, 50.0), initial_investment, years);
    let optimistic_rate = implied_annual_rate(percentile(&final_values, 90.0), initial_investment, years);

    CHECKPOINT_YEARS
        .iter()
        .filter(|&&year| year <= years)
        .map(|&year| Projection {
            year,
            conservative: project_value(initial_investment, conservative_rate, year),
            expected: project_value(initial_investment, expected_rate, year),
            optimistic: project_value(initial_investment, optimistic_rate, year),
        })
        .collect()
}

/// Convenience wrapper: portfolio stats plus a default-sized simulation.
pub async fn project_growth(
    provider: &dyn MarketDataProvider,
    portfolio: &[PortfolioEntry],
    initial_investment: f64,
    sampler: &mut (dyn ReturnSampler + Send),
) -> Result<Vec<Projection>> {
    let stats = portfolio_stats(provider, portfolio).await?;
    Ok(simulate(
        stats,
        initial_investment,
        DEFAULT_YEARS,
        DEFAULT_SIMULATIONS,
        sampler,
    ))
}

// Constant annual rate that turns `initial` into `terminal` over `years`.
// Terminal values driven below zero by extreme draws are floored at zero so
// the implied rate stays real-valued.
fn implied_annual_rate(terminal: f64, initial: f64, years: u32) -> f64 {
    if initial <= 0.0 || years == 0 {
        return 0.0;
    }
    (terminal.max(0.0) / initial).powf(1.0 / years as f64) - 1.0
}

fn project_value(initial: f64, rate: f64, year: u32) -> f64 {
    (initial * (1.0 + rate).powi(year as i32)).round()
}

// Percentile with linear interpolation between closest ranks over an
// ascending-sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types::{EtfMetadata, PricePoint};
    use chrono::NaiveDate;

    struct ConstantSampler(f64);

    impl ReturnSampler for ConstantSampler {
        fn sample(&mut self, _mean: f64, _std_dev: f64) -> f64 {
            self.0
        }
    }

    fn stats(annual_return: f64, annual_volatility: f64) -> PortfolioStats {
        PortfolioStats {
            annual_return,
            annual_volatility,
        }
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&values, 0.0), 10.0);
        assert_eq!(percentile(&values, 50.0), 30.0);
        assert_eq!(percentile(&values, 100.0), 50.0);
        // rank 0.4 between 10 and 20.
        assert!((percentile(&values, 10.0) - 14.0).abs() < 1e-9);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn constant_returns_collapse_all_scenarios() {
        let mut sampler = ConstantSampler(0.07);
        let projections = simulate(stats(0.07, 0.0), 10_000.0, 20, 100, &mut sampler);

        assert_eq!(
            projections.iter().map(|p| p.year).collect::<Vec<_>>(),
            vec![5, 10, 15, 20]
        );
        for p in &projections {
            let exact = (10_000.0 * 1.07f64.powi(p.year as i32)).round();
            assert_eq!(p.conservative, exact);
            assert_eq!(p.expected, exact);
            assert_eq!(p.optimistic, exact);
        }
    }

    #[test]
    fn scenarios_are_ordered_for_volatile_portfolios() {
        let mut sampler = NormalSampler::seeded(42);
        let projections = simulate(stats(0.06, 0.15), 10_000.0, 20, 500, &mut sampler);

        assert_eq!(projections.len(), 4);
        for p in &projections {
            assert!(p.conservative <= p.expected, "year {}", p.year);
            assert!(p.expected <= p.optimistic, "year {}", p.year);
            assert!(p.conservative >= 0.0);
        }
        // With positive drift and 500 runs the spread should be strict at
        // the terminal year.
        let terminal = projections.last().unwrap();
        assert!(terminal.conservative < terminal.optimistic);
    }

    #[test]
    fn seeded_sampler_is_reproducible() {
        let run = |seed| {
            let mut sampler = NormalSampler::seeded(seed);
            simulate(stats(0.05, 0.12), 5_000.0, 20, 200, &mut sampler)
        };
        let a = run(7);
        let b = run(7);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.expected, y.expected);
            assert_eq!(x.conservative, y.conservative);
            assert_eq!(x.optimistic, y.optimistic);
        }
    }

    #[test]
    fn ruinous_outcomes_floor_at_zero() {
        // Every year loses everything and more; the implied rate floors the
        // terminal value at zero instead of going complex.
        let mut sampler = ConstantSampler(-1.5);
        let projections = simulate(stats(0.0, 0.0), 10_000.0, 20, 50, &mut sampler);
        for p in &projections {
            assert!(p.conservative.is_finite());
            assert!(p.conservative >= 0.0);
            assert!(p.optimistic >= 0.0);
        }
    }

    struct FiveYearProvider;

    #[async_trait::async_trait]
    impl MarketDataProvider for FiveYearProvider {
        async fn etf_metadata(&self) -> Result<Vec<EtfMetadata>> {
            Ok(Vec::new())
        }

        async fn price_history(
            &self,
            _symbol: &str,
            _lookback_days: i64,
        ) -> Result<Vec<PricePoint>> {
            // 50% total return over the window.
            let first = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
            Ok((0..1000)
                .map(|i| PricePoint {
                    date: first + chrono::Duration::days(i),
                    close_price: 100.0 + 50.0 * i as f64 / 999.0,
                })
                .collect())
        }

        async fn latest_price(&self, _symbol: &str) -> Result<Option<f64>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn portfolio_stats_weight_by_allocation() {
        let entries = vec![
            PortfolioEntry {
                symbol: "VOO".into(),
                name: "S&P 500".into(),
                category: "US Large Cap".into(),
                allocation_pct: 60,
                dollar_amount: 6_000.0,
                historical_data: Vec::new(),
            },
            PortfolioEntry {
                symbol: "BND".into(),
                name: "Total Bond Market".into(),
                category: "Bonds".into(),
                allocation_pct: 40,
                dollar_amount: 4_000.0,
                historical_data: Vec::new(),
            },
        ];

        let stats = portfolio_stats(&FiveYearProvider, &entries).await.unwrap();

        // Both entries share the same series: 50% / 5 = 10% annual return,
        // weighted by a total allocation of 100%.
        assert!((stats.annual_return - 0.10).abs() < 1e-9);
        assert!(stats.annual_volatility > 0.0);
    }
}
