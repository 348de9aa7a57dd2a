//! Administration of the tracked-ETF metadata table. The worker's `etfs`
//! subcommand drives these; the symbol set here is what the ingest and the
//! market-data endpoint operate on.

use crate::market::types::EtfMetadata;
use anyhow::Context;

pub async fn list_etfs(pool: &sqlx::PgPool) -> anyhow::Result<Vec<EtfMetadata>> {
    let rows = sqlx::query_as::<_, (String, String, f64)>(
        "SELECT symbol, name, expense_ratio FROM etfs ORDER BY symbol ASC",
    )
    .fetch_all(pool)
    .await
    .context("select etfs failed")?;

    Ok(rows
        .into_iter()
        .map(|(symbol, name, expense_ratio)| EtfMetadata {
            symbol,
            name,
            expense_ratio,
        })
        .collect())
}

/// Inserts a new tracked ETF. Fails if the symbol is already tracked.
pub async fn add_etf(
    pool: &sqlx::PgPool,
    symbol: &str,
    name: &str,
    expense_ratio: f64,
) -> anyhow::Result<()> {
    let symbol = symbol.trim().to_uppercase();
    sqlx::query("INSERT INTO etfs (symbol, name, expense_ratio) VALUES ($1, $2, $3)")
        .persistent(false)
        .bind(&symbol)
        .bind(name.trim())
        .bind(expense_ratio)
        .execute(pool)
        .await
        .with_context(|| format!("insert etfs failed for {symbol}"))?;
    Ok(())
}

/// Removes an ETF and all of its cached price history in one transaction.
/// Returns false when the symbol was not tracked.
pub async fn remove_etf(pool: &sqlx::PgPool, symbol: &str) -> anyhow::Result<bool> {
    let symbol = symbol.trim().to_uppercase();
    let mut tx = pool.begin().await.context("begin transaction failed")?;

    sqlx::query("DELETE FROM etf_prices WHERE symbol = $1")
        .persistent(false)
        .bind(&symbol)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("delete etf_prices failed for {symbol}"))?;

    let res = sqlx::query("DELETE FROM etfs WHERE symbol = $1")
        .persistent(false)
        .bind(&symbol)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("delete etfs failed for {symbol}"))?;

    tx.commit().await.context("commit transaction failed")?;
    Ok(res.rows_affected() > 0)
}

/// Partial update for an existing ETF; unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct EtfUpdate {
    pub name: Option<String>,
    pub expense_ratio: Option<f64>,
}

impl EtfUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.expense_ratio.is_none()
    }
}

/// Applies the update. Returns false when the symbol was not tracked.
pub async fn update_etf(
    pool: &sqlx::PgPool,
    symbol: &str,
    update: &EtfUpdate,
) -> anyhow::Result<bool> {
    anyhow::ensure!(
        !update.is_empty(),
        "nothing to update; provide a name and/or expense ratio"
    );
    let symbol = symbol.trim().to_uppercase();

    let mut qb = sqlx::QueryBuilder::new("UPDATE etfs SET ");
    let mut set = qb.separated(", ");
    if let Some(name) = &update.name {
        set.push("name = ").push_bind_unseparated(name.trim());
    }
    if let Some(expense_ratio) = update.expense_ratio {
        set.push("expense_ratio = ").push_bind_unseparated(expense_ratio);
    }
    qb.push(" WHERE symbol = ").push_bind(&symbol);

    let res = qb
        .build()
        .persistent(false)
        .execute(pool)
        .await
        .with_context(|| format!("update etfs failed for {symbol}"))?;
    Ok(res.rows_affected() > 0)
}

/// Batch metadata upsert used by the stub seeder.
pub async fn upsert_etf_metadata(
    pool: &sqlx::PgPool,
    items: &[EtfMetadata],
) -> anyhow::Result<u64> {
    anyhow::ensure!(!items.is_empty(), "items must be non-empty");

    let mut qb = sqlx::QueryBuilder::new("INSERT INTO etfs (symbol, name, expense_ratio) ");
    qb.push_values(items, |mut b, item| {
        b.push_bind(item.symbol.trim())
            .push_bind(item.name.trim())
            .push_bind(item.expense_ratio);
    });
    qb.push(
        " ON CONFLICT (symbol) DO UPDATE \
           SET name = EXCLUDED.name, expense_ratio = EXCLUDED.expense_ratio",
    );

    let res = qb
        .build()
        .persistent(false)
        .execute(pool)
        .await
        .context("upsert etfs failed")?;
    Ok(res.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_no_fields_is_rejected_by_shape() {
        assert!(EtfUpdate::default().is_empty());
        assert!(!EtfUpdate {
            name: Some("Vanguard S&P 500 ETF".into()),
            expense_ratio: None,
        }
        .is_empty());
        assert!(!EtfUpdate {
            name: None,
            expense_ratio: Some(0.03),
        }
        .is_empty());
    }
}
