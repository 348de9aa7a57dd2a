//! Pure statistics over a chronologically ascending close-price series.
//!
//! Degenerate inputs (fewer than two points, zero start price, zero
//! variance) yield 0.0 instead of an error so that a thin or missing price
//! history can never fail a recommendation request.

use crate::market::types::PricePoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized risk-free rate used for Sharpe ratios unless overridden.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.04;

/// Total percentage return between the first and last entry of the series.
pub fn historical_return(series: &[PricePoint]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let start = series[0].close_price;
    let end = series[series.len() - 1].close_price;
    if start == 0.0 {
        return 0.0;
    }
    round2((end - start) / start * 100.0)
}

/// Year-to-date percentage return: live price against the first close of the
/// YTD series. A missing live price is passed in as 0.0 and yields 0.0, the
/// same as a missing series.
pub fn ytd_return(live_price: f64, series: &[PricePoint]) -> f64 {
    if live_price <= 0.0 {
        return 0.0;
    }
    let Some(first) = series.first() else {
        return 0.0;
    };
    if first.close_price == 0.0 {
        return 0.0;
    }
    round2((live_price - first.close_price) / first.close_price * 100.0)
}

/// Annualized volatility as a percentage: standard deviation of
/// day-over-day percentage changes scaled by sqrt(252).
pub fn volatility(series: &[PricePoint]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let daily = daily_returns(series);
    round2(sample_std_dev(&daily) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Annualized Sharpe ratio: mean daily excess return over the daily
/// risk-free rate, divided by the standard deviation of the excess series,
/// scaled by sqrt(252).
pub fn sharpe_ratio(series: &[PricePoint], annual_risk_free_rate: f64) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let daily_rf = annual_risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = daily_returns(series)
        .into_iter()
        .map(|r| r - daily_rf)
        .collect();

    let std_dev = sample_std_dev(&excess);
    if std_dev == 0.0 {
        return 0.0;
    }
    round2(mean(&excess) / std_dev * TRADING_DAYS_PER_YEAR.sqrt())
}

fn daily_returns(series: &[PricePoint]) -> Vec<f64> {
    series
        .windows(2)
        .filter(|w| w[0].close_price != 0.0)
        .map(|w| (w[1].close_price - w[0].close_price) / w[0].close_price)
        .collect()
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

// Sample standard deviation (n - 1 denominator). A single observation has
// no dispersion estimate, so it degrades to 0.0.
fn sample_std_dev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close_price)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close_price,
            })
            .collect()
    }

    #[test]
    fn short_series_yield_zero_everywhere() {
        for s in [series(&[]), series(&[100.0])] {
            assert_eq!(historical_return(&s), 0.0);
            assert_eq!(volatility(&s), 0.0);
            assert_eq!(sharpe_ratio(&s, DEFAULT_RISK_FREE_RATE), 0.0);
        }
    }

    #[test]
    fn two_point_series_returns_ten_percent() {
        let s = series(&[100.0, 110.0]);
        assert_eq!(historical_return(&s), 10.0);
    }

    #[test]
    fn zero_start_price_returns_zero() {
        let s = series(&[0.0, 110.0]);
        assert_eq!(historical_return(&s), 0.0);
    }

    #[test]
    fn flat_series_has_zero_volatility_and_sharpe() {
        let s = series(&[50.0, 50.0, 50.0, 50.0]);
        assert_eq!(volatility(&s), 0.0);
        // Excess returns are constant, so their dispersion is zero and the
        // divide-by-zero guard kicks in.
        assert_eq!(sharpe_ratio(&s, DEFAULT_RISK_FREE_RATE), 0.0);
    }

    #[test]
    fn volatility_is_annualized_sample_std_dev() {
        let s = series(&[100.0, 110.0, 99.0, 104.94]);
        // Daily returns: 0.10, -0.10, 0.06.
        let daily = [0.10, -0.10, 0.06];
        let m: f64 = daily.iter().sum::<f64>() / 3.0;
        let var: f64 = daily.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 2.0;
        let expected = round2(var.sqrt() * 252f64.sqrt() * 100.0);
        assert_eq!(volatility(&s), expected);
    }

    #[test]
    fn sharpe_ratio_matches_hand_computation() {
        let s = series(&[100.0, 102.0, 103.02, 101.9898]);
        // Daily returns: 0.02, 0.01, -0.01.
        let daily_rf = DEFAULT_RISK_FREE_RATE / 252.0;
        let excess: Vec<f64> = [0.02, 0.01, -0.01].iter().map(|r| r - daily_rf).collect();
        let m: f64 = excess.iter().sum::<f64>() / 3.0;
        let var: f64 = excess.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 2.0;
        let expected = round2(m / var.sqrt() * 252f64.sqrt());
        assert_eq!(sharpe_ratio(&s, DEFAULT_RISK_FREE_RATE), expected);
    }

    #[test]
    fn ytd_return_against_first_close() {
        let s = series(&[200.0, 210.0, 190.0]);
        assert_eq!(ytd_return(220.0, &s), 10.0);
        assert_eq!(ytd_return(0.0, &[]), 0.0);
    }

    #[test]
    fn missing_live_price_yields_zero_ytd() {
        // A live price of 0.0 stands for "no quote"; it must read as no
        // data, not as a -100% move.
        let s = series(&[200.0, 210.0, 190.0]);
        assert_eq!(ytd_return(0.0, &s), 0.0);
    }
}
