use crate::market::types::PricePoint;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

pub async fn upsert_price_history(
    pool: &sqlx::PgPool,
    symbol: &str,
    points: &[PricePoint],
) -> anyhow::Result<u64> {
    anyhow::ensure!(!points.is_empty(), "points must be non-empty");

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    // Batch the upsert to reduce round trips; keep it transactional so one
    // symbol's history lands atomically.
    let chunk_size: usize = std::env::var("PRICE_UPSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(500);
    anyhow::ensure!(chunk_size >= 1, "PRICE_UPSERT_BATCH must be >= 1");

    let mut affected: u64 = 0;
    let mut batch_idx: usize = 0;
    for chunk in points.chunks(chunk_size) {
        batch_idx += 1;
        let t0 = std::time::Instant::now();

        let mut qb = sqlx::QueryBuilder::new("INSERT INTO etf_prices (symbol, date, close_price) ");
        qb.push_values(chunk, |mut b, point| {
            b.push_bind(symbol)
                .push_bind(point.date)
                .push_bind(point.close_price);
        });
        qb.push(" ON CONFLICT (symbol, date) DO UPDATE SET close_price = EXCLUDED.close_price");

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("batch upsert etf_prices failed for {symbol}"))?;
        affected += res.rows_affected();

        tracing::debug!(
            symbol,
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "etf_prices batch upsert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(affected)
}

pub async fn record_ingest_run(
    pool: &sqlx::PgPool,
    run_date: NaiveDate,
    provider: &str,
    status: &str,
    error: Option<&str>,
    raw_response: Option<Value>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let generated_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO price_ingest_runs (id, run_date, generated_at, provider, status, error, raw_response) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .persistent(false)
    .bind(id)
    .bind(run_date)
    .bind(generated_at)
    .bind(provider)
    .bind(status)
    .bind(error)
    .bind(raw_response)
    .execute(pool)
    .await
    .context("insert price_ingest_runs failed")?;

    Ok(id)
}
