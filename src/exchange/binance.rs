//! Binance USDT-margined futures REST client.
//!
//! Only public market-data endpoints are used, so no credentials are needed.
//! Every request goes through the same pipeline: circuit breaker check,
//! rate limiter, HTTP GET, then retry with backoff on transient failures.

use super::{Candle, ExchangeError, MarketDataSource, MarketInfo, Timeframe};
use crate::resilience::{CircuitBreaker, RetryPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";

/// Largest page the klines endpoint returns
const KLINES_PAGE_LIMIT: usize = 1500;

const BREAKER_FAILURES: u32 = 5;
const BREAKER_COOLDOWN: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

type DirectRateLimiter =
    RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    contract_type: String,
    status: String,
    base_asset: String,
    quote_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    quote_volume: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterest {
    open_interest: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterestHist {
    sum_open_interest: String,
}

/// One parsed kline row
#[derive(Debug, Clone, Copy, PartialEq)]
struct Kline {
    open_time: i64,
    close: f64,
    quote_volume: f64,
}

pub struct BinanceFuturesClient {
    http: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<DirectRateLimiter>,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
}

impl BinanceFuturesClient {
    /// Client against the production endpoint, spacing requests at least
    /// `min_interval` apart.
    pub fn new(min_interval: Duration) -> Result<Self, ExchangeError> {
        Self::with_base_url(DEFAULT_BASE_URL, min_interval)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        min_interval: Duration,
    ) -> Result<Self, ExchangeError> {
        let quota = Quota::with_period(min_interval).ok_or_else(|| {
            ExchangeError::Parse("rate limit interval must be non-zero".to_string())
        })?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            breaker: CircuitBreaker::new(BREAKER_FAILURES, BREAKER_COOLDOWN),
            retry: RetryPolicy::default(),
        })
    }

    /// GET `path` and deserialize the JSON body
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();

        let body = self
            .retry
            .run(path, ExchangeError::is_transient, move || async move {
                if self.breaker.is_open() {
                    return Err(ExchangeError::CircuitOpen(path.to_string()));
                }
                self.rate_limiter.until_ready().await;

                let result = self.send(url, path, query).await;
                match &result {
                    Ok(_) => self.breaker.record_success(),
                    Err(e) if e.is_transient() => self.breaker.record_failure(),
                    Err(_) => {}
                }
                result
            })
            .await?;

        serde_json::from_value(body)
            .map_err(|e| ExchangeError::Parse(format!("{}: {}", path, e)))
    }

    async fn send(
        &self,
        url: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ExchangeError> {
        debug!(endpoint = path, ?query, "GET");
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    async fn klines(
        &self,
        market_id: &str,
        timeframe: Timeframe,
        start_ms: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Kline>, ExchangeError> {
        let mut query = vec![
            ("symbol", market_id.to_string()),
            ("interval", timeframe.as_str().to_string()),
            ("limit", limit.min(KLINES_PAGE_LIMIT).to_string()),
        ];
        if let Some(start) = start_ms {
            query.push(("startTime", start.to_string()));
        }
        let rows: Vec<Vec<Value>> = self.get("/fapi/v1/klines", &query).await?;
        rows.iter().map(|row| parse_kline(row)).collect()
    }
}

fn parse_number(value: &Value, field: &str) -> Result<f64, ExchangeError> {
    match value {
        Value::String(s) => parse_decimal_str(s, field),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ExchangeError::Parse(format!("{} out of range", field))),
        other => Err(ExchangeError::Parse(format!(
            "{}: expected number, got {}",
            field, other
        ))),
    }
}

fn parse_decimal_str(s: &str, field: &str) -> Result<f64, ExchangeError> {
    s.parse::<f64>()
        .map_err(|e| ExchangeError::Parse(format!("{} '{}': {}", field, s, e)))
}

/// Kline rows are positional arrays:
/// `[open_time, open, high, low, close, volume, close_time, quote_volume, ...]`
fn parse_kline(row: &[Value]) -> Result<Kline, ExchangeError> {
    if row.len() < 8 {
        return Err(ExchangeError::Parse(format!(
            "kline row has {} fields, expected at least 8",
            row.len()
        )));
    }
    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| ExchangeError::Parse(format!("kline open time: {}", row[0])))?;
    Ok(Kline {
        open_time,
        close: parse_number(&row[4], "close")?,
        quote_volume: parse_number(&row[7], "quote volume")?,
    })
}

fn select_markets(info: ExchangeInfo, quote: &str) -> Vec<MarketInfo> {
    info.symbols
        .into_iter()
        .filter(|s| {
            s.contract_type == "PERPETUAL"
                && s.status == "TRADING"
                && s.quote_asset.eq_ignore_ascii_case(quote)
        })
        .map(|s| MarketInfo {
            symbol: format!("{}/{}", s.base_asset, s.quote_asset),
            id: s.symbol,
            base: s.base_asset,
            quote: s.quote_asset,
        })
        .collect()
}

fn timestamp_from_millis(ms: i64) -> Result<DateTime<Utc>, ExchangeError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| ExchangeError::Parse(format!("timestamp out of range: {}", ms)))
}

#[async_trait]
impl MarketDataSource for BinanceFuturesClient {
    async fn load_markets(&self, quote: &str) -> Result<Vec<MarketInfo>, ExchangeError> {
        let info: ExchangeInfo = self.get("/fapi/v1/exchangeInfo", &[]).await?;
        let markets = select_markets(info, quote);
        debug!(quote, count = markets.len(), "Loaded perpetual markets");
        Ok(markets)
    }

    async fn fetch_candles(
        &self,
        market: &MarketInfo,
        timeframe: Timeframe,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let mut candles = Vec::with_capacity(limit);
        let mut start_ms = since.timestamp_millis();

        while candles.len() < limit {
            let page = (limit - candles.len()).min(KLINES_PAGE_LIMIT);
            let rows = self
                .klines(&market.id, timeframe, Some(start_ms), page)
                .await?;
            let Some(last) = rows.last().copied() else {
                break;
            };
            for k in &rows {
                candles.push(Candle {
                    timestamp: timestamp_from_millis(k.open_time)?,
                    close: k.close,
                });
            }
            if rows.len() < page {
                break;
            }
            start_ms = last.open_time + timeframe.millis();
        }

        candles.truncate(limit);
        Ok(candles)
    }

    async fn daily_quote_volume(&self, market_id: &str) -> Result<f64, ExchangeError> {
        let ticker: Ticker24h = self
            .get("/fapi/v1/ticker/24hr", &[("symbol", market_id.to_string())])
            .await?;
        parse_decimal_str(&ticker.quote_volume, "quoteVolume")
    }

    async fn daily_quote_volume_fallback(&self, market_id: &str) -> Result<f64, ExchangeError> {
        let rows = self.klines(market_id, Timeframe::OneHour, None, 24).await?;
        Ok(rows.iter().map(|k| k.quote_volume).sum())
    }

    async fn open_interest(&self, market_id: &str) -> Result<f64, ExchangeError> {
        let oi: OpenInterest = self
            .get("/fapi/v1/openInterest", &[("symbol", market_id.to_string())])
            .await?;
        parse_decimal_str(&oi.open_interest, "openInterest")
    }

    async fn open_interest_fallback(&self, market_id: &str) -> Result<f64, ExchangeError> {
        let history: Vec<OpenInterestHist> = self
            .get(
                "/futures/data/openInterestHist",
                &[
                    ("symbol", market_id.to_string()),
                    ("period", "5m".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        let latest = history
            .last()
            .ok_or_else(|| ExchangeError::Parse(format!("no open interest history for {}", market_id)))?;
        parse_decimal_str(&latest.sum_open_interest, "sumOpenInterest")
    }
}
