use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use folio_core::market::types::{EtfMetadata, PricePoint};
use folio_core::market::upstream::UpstreamQuoteClient;
use folio_core::storage::{etfs, prices};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackfillSummary {
    pub symbols_ok: usize,
    pub symbols_failed: usize,
    pub rows_written: u64,
}

/// Pulls the daily close series for each symbol from the upstream quote API
/// and upserts it into the price cache, bounded to the lookback window.
/// Individual symbol failures are skipped and counted; the run only fails
/// outright when nothing could be ingested.
pub async fn backfill_from_upstream(
    client: &UpstreamQuoteClient,
    pool: &sqlx::PgPool,
    symbols: &[String],
    run_date: NaiveDate,
    lookback_days: i64,
) -> Result<BackfillSummary> {
    let window_start = run_date - chrono::Duration::days(lookback_days);

    let req_delay_ms = std::env::var("QUOTE_REQ_DELAY_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(250);
    let req_delay = Duration::from_millis(req_delay_ms);

    let mut summary = BackfillSummary {
        symbols_ok: 0,
        symbols_failed: 0,
        rows_written: 0,
    };

    for (idx, symbol) in symbols.iter().enumerate() {
        if idx != 0 {
            tokio::time::sleep(req_delay).await;
        }

        match client.fetch_daily_series(symbol).await {
            Ok(series) => {
                let window: Vec<PricePoint> = series
                    .into_iter()
                    .filter(|p| p.date >= window_start && p.date <= run_date)
                    .collect();
                if window.is_empty() {
                    tracing::warn!(symbol, %window_start, "no closes inside lookback window; skipping");
                    summary.symbols_failed += 1;
                    continue;
                }

                let rows = prices::upsert_price_history(pool, symbol, &window)
                    .await
                    .with_context(|| format!("price upsert failed for {symbol}"))?;
                summary.symbols_ok += 1;
                summary.rows_written += rows;
            }
            Err(err) => {
                summary.symbols_failed += 1;
                tracing::warn!(symbol, error = %err, "daily series fetch failed; skipping symbol");
            }
        }
    }

    anyhow::ensure!(
        summary.symbols_ok > 0,
        "backfill ingested nothing ({} symbols failed)",
        summary.symbols_failed
    );
    Ok(summary)
}

/// Seeds the cache with deterministic synthetic price walks plus placeholder
/// metadata, for development and CI environments without upstream access.
/// The walk for a symbol depends only on the symbol, so reseeding is
/// idempotent in shape.
pub async fn seed_stub_market_data(
    pool: &sqlx::PgPool,
    symbols: &[String],
    run_date: NaiveDate,
    lookback_days: i64,
) -> Result<BackfillSummary> {
    let metadata: Vec<EtfMetadata> = symbols
        .iter()
        .map(|symbol| EtfMetadata {
            symbol: symbol.clone(),
            name: format!("{symbol} Stub Index Fund"),
            expense_ratio: 0.03 + (symbol_seed(symbol) % 20) as f64 / 100.0,
        })
        .collect();
    etfs::upsert_etf_metadata(pool, &metadata).await?;

    let mut summary = BackfillSummary {
        symbols_ok: 0,
        symbols_failed: 0,
        rows_written: 0,
    };

    for symbol in symbols {
        let series = synthetic_walk(symbol, run_date, lookback_days);
        let rows = prices::upsert_price_history(pool, symbol, &series)
            .await
            .with_context(|| format!("stub upsert failed for {symbol}"))?;
        summary.symbols_ok += 1;
        summary.rows_written += rows;
    }

    Ok(summary)
}

// Multiplicative random walk over weekdays: mild positive drift, ~16%
// annualized volatility at the daily scale.
fn synthetic_walk(symbol: &str, run_date: NaiveDate, lookback_days: i64) -> Vec<PricePoint> {
    let mut rng = StdRng::seed_from_u64(symbol_seed(symbol));
    let daily = Normal::new(0.0004, 0.01).expect("valid stub distribution");

    let start = run_date - chrono::Duration::days(lookback_days);
    let mut price = 40.0 + (symbol_seed(symbol) % 400) as f64;
    let mut out = Vec::new();

    let mut date = start;
    while date <= run_date {
        if !matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            price *= 1.0 + daily.sample(&mut rng);
            out.push(PricePoint {
                date,
                close_price: (price * 100.0).round() / 100.0,
            });
        }
        date = date + chrono::Duration::days(1);
    }
    out
}

fn symbol_seed(symbol: &str) -> u64 {
    symbol
        .bytes()
        .fold(0xF0_110u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_walk_is_deterministic_and_weekday_only() {
        let run_date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        let a = synthetic_walk("VOO", run_date, 30);
        let b = synthetic_walk("VOO", run_date, 30);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert!(a.iter().all(|p| !matches!(
            p.date.weekday(),
            chrono::Weekday::Sat | chrono::Weekday::Sun
        )));
        assert!(a.windows(2).all(|w| w[0].date < w[1].date));
        assert!(a.iter().all(|p| p.close_price > 0.0));
    }

    #[test]
    fn different_symbols_get_different_walks() {
        let run_date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        let voo = synthetic_walk("VOO", run_date, 30);
        let bnd = synthetic_walk("BND", run_date, 30);
        assert_ne!(voo, bnd);
    }
}
