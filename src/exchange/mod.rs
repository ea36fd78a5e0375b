//! Market Data Abstraction Layer
//!
//! The screener only needs close prices, 24h volume and open interest.
//! New venues can be added by implementing [`MarketDataSource`] without
//! touching the statistics or screening code.

pub mod binance;
pub mod synthetic;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use binance::BinanceFuturesClient;
pub use synthetic::{SyntheticConfig, SyntheticMarket};

/// Errors from a market data source
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Request to {endpoint} failed with status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Circuit breaker is refusing requests
    #[error("Circuit breaker open, refusing request to {0}")]
    CircuitOpen(String),

    /// Symbol not known to the source
    #[error("Unknown market: {0}")]
    UnknownMarket(String),
}

impl ExchangeError {
    /// Whether retrying the request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ExchangeError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ExchangeError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A tradable market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Venue identifier used for REST calls (e.g. "BTCUSDT")
    pub id: String,
    /// Display symbol used for series and reports (e.g. "BTC/USDT")
    pub symbol: String,
    /// Base asset (e.g. "BTC")
    pub base: String,
    /// Quote asset (e.g. "USDT")
    pub quote: String,
}

impl MarketInfo {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            id: format!("{}{}", base, quote),
            symbol: format!("{}/{}", base, quote),
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }
}

/// A single close-price sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Sampling interval of price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    OneMinute,
    FiveMinute,
    FifteenMinute,
    ThirtyMinute,
    OneHour,
    TwoHour,
    #[default]
    FourHour,
    SixHour,
    TwelveHour,
    OneDay,
}

impl Timeframe {
    /// Interval length in seconds
    pub fn seconds(self) -> i64 {
        match self {
            Timeframe::OneMinute => 60,
            Timeframe::FiveMinute => 300,
            Timeframe::FifteenMinute => 900,
            Timeframe::ThirtyMinute => 1_800,
            Timeframe::OneHour => 3_600,
            Timeframe::TwoHour => 7_200,
            Timeframe::FourHour => 14_400,
            Timeframe::SixHour => 21_600,
            Timeframe::TwelveHour => 43_200,
            Timeframe::OneDay => 86_400,
        }
    }

    /// Interval length in milliseconds
    pub fn millis(self) -> i64 {
        self.seconds() * 1_000
    }

    /// Exchange interval code (e.g. "4h")
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinute => "5m",
            Timeframe::FifteenMinute => "15m",
            Timeframe::ThirtyMinute => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::TwoHour => "2h",
            Timeframe::FourHour => "4h",
            Timeframe::SixHour => "6h",
            Timeframe::TwelveHour => "12h",
            Timeframe::OneDay => "1d",
        }
    }

    /// Number of bars covering `days` of history
    pub fn bars_in_days(self, days: u32) -> usize {
        (days as i64 * 86_400 / self.seconds()) as usize
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Timeframe::OneMinute),
            "5m" => Ok(Timeframe::FiveMinute),
            "15m" => Ok(Timeframe::FifteenMinute),
            "30m" => Ok(Timeframe::ThirtyMinute),
            "1h" => Ok(Timeframe::OneHour),
            "2h" => Ok(Timeframe::TwoHour),
            "4h" => Ok(Timeframe::FourHour),
            "6h" => Ok(Timeframe::SixHour),
            "12h" => Ok(Timeframe::TwelveHour),
            "1d" | "d" => Ok(Timeframe::OneDay),
            _ => Err(format!(
                "Unknown timeframe: '{}'. Valid options: 1m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 12h, 1d",
                s
            )),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(value: Timeframe) -> Self {
        value.as_str().to_string()
    }
}

/// Source of market metadata, prices and liquidity figures.
///
/// Each liquidity figure has a primary and a fallback lookup; callers try
/// them in that order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Active linear perpetual markets quoted in `quote`
    async fn load_markets(&self, quote: &str) -> Result<Vec<MarketInfo>, ExchangeError>;

    /// Close prices from `since`, oldest first, at most `limit` bars
    async fn fetch_candles(
        &self,
        market: &MarketInfo,
        timeframe: Timeframe,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError>;

    /// Rolling 24h quote volume (primary endpoint)
    async fn daily_quote_volume(&self, market_id: &str) -> Result<f64, ExchangeError>;

    /// Rolling 24h quote volume (secondary endpoint)
    async fn daily_quote_volume_fallback(&self, market_id: &str) -> Result<f64, ExchangeError>;

    /// Current open interest (primary endpoint)
    async fn open_interest(&self, market_id: &str) -> Result<f64, ExchangeError>;

    /// Current open interest (secondary endpoint)
    async fn open_interest_fallback(&self, market_id: &str) -> Result<f64, ExchangeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_from_str() {
        assert_eq!("4h".parse::<Timeframe>().unwrap(), Timeframe::FourHour);
        assert_eq!("1D".parse::<Timeframe>().unwrap(), Timeframe::OneDay);
        assert!("3h".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_timeframe_display_round_trip() {
        for tf in [Timeframe::OneMinute, Timeframe::FourHour, Timeframe::OneDay] {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
        }
    }

    #[test]
    fn test_bars_in_days() {
        assert_eq!(Timeframe::FourHour.bars_in_days(90), 540);
        assert_eq!(Timeframe::OneHour.bars_in_days(1), 24);
        assert_eq!(Timeframe::OneDay.bars_in_days(30), 30);
    }

    #[test]
    fn test_timeframe_serde() {
        let json = serde_json::to_string(&Timeframe::FourHour).unwrap();
        assert_eq!(json, "\"4h\"");
        let tf: Timeframe = serde_json::from_str("\"15m\"").unwrap();
        assert_eq!(tf, Timeframe::FifteenMinute);
    }

    #[test]
    fn test_market_info_new() {
        let m = MarketInfo::new("BTC", "USDT");
        assert_eq!(m.id, "BTCUSDT");
        assert_eq!(m.symbol, "BTC/USDT");
    }

    #[test]
    fn test_transient_errors() {
        let throttled = ExchangeError::Status {
            endpoint: "/fapi/v1/klines".into(),
            status: 429,
            body: String::new(),
        };
        assert!(throttled.is_transient());
        let bad_request = ExchangeError::Status {
            endpoint: "/fapi/v1/klines".into(),
            status: 400,
            body: String::new(),
        };
        assert!(!bad_request.is_transient());
        assert!(!ExchangeError::Parse("bad".into()).is_transient());
    }
}
