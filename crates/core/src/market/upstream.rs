use crate::config::Settings;
use crate::market::types::PricePoint;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;

/// Client for the upstream daily-quote HTTP API used to backfill the price
/// cache. The API speaks the Alpha-Vantage-style query protocol: a single
/// `/query` endpoint switched on a `function` parameter, with string-typed
/// numeric fields.
#[derive(Debug, Clone)]
pub struct UpstreamQuoteClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retries: u32,
}

impl UpstreamQuoteClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_quote_api_base_url()?.to_string();
        let api_key = settings.quote_api_key.clone();

        let timeout_secs = std::env::var("QUOTE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("QUOTE_API_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build quote api http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries,
        })
    }

    /// Full daily close series for a symbol, ascending by date.
    pub async fn fetch_daily_series(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_daily_series_once(symbol).await {
                Ok(series) => return Ok(series),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(symbol, attempt, ?backoff, error = %err, "daily series fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Latest quote for a symbol, or None when the upstream has no entry.
    pub async fn fetch_latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        let raw = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;

        let quote = raw.get("Global Quote").and_then(Value::as_object);
        let Some(quote) = quote else {
            return Ok(None);
        };

        // Upstream field keys are inconsistently numbered across deployments.
        let price = quote
            .get("05. price")
            .or_else(|| quote.get("5. price"))
            .and_then(Value::as_str);

        match price {
            Some(s) => {
                let parsed = s
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("unparseable quote price for {symbol}: {s}"))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    async fn fetch_daily_series_once(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let raw = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "full"),
            ])
            .await?;

        parse_daily_series(&raw, symbol)
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));

        let mut req = self.http.get(url).query(params);
        if let Some(api_key) = &self.api_key {
            req = req.query(&[("apikey", api_key.as_str())]);
        }

        let res = req.send().await.context("quote api request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read quote api response")?;
        let raw = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("quote api response is not valid JSON: {text}"))?;

        if !status.is_success() {
            anyhow::bail!("quote api HTTP {status}: {raw}");
        }

        Ok(raw)
    }
}

fn parse_daily_series(raw: &Value, symbol: &str) -> Result<Vec<PricePoint>> {
    let series = raw
        .get("Time Series (Daily)")
        .and_then(Value::as_object)
        .with_context(|| format!("daily series missing from upstream response for {symbol}"))?;

    let mut points = Vec::with_capacity(series.len());
    for (date_str, fields) in series {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .with_context(|| format!("invalid series date for {symbol}: {date_str}"))?;
        let close = fields
            .get("4. close")
            .and_then(Value::as_str)
            .with_context(|| format!("missing close for {symbol} on {date_str}"))?;
        let close_price = close
            .trim()
            .parse::<f64>()
            .with_context(|| format!("unparseable close for {symbol} on {date_str}: {close}"))?;
        points.push(PricePoint { date, close_price });
    }

    anyhow::ensure!(!points.is_empty(), "empty daily series for {symbol}");
    points.sort_by_key(|p| p.date);
    Ok(points)
}
