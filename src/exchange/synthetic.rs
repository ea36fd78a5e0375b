//! Deterministic offline market used by `--synthetic` runs and tests.
//!
//! Markets come in pairs: an even-indexed market is a random walk and the
//! following odd-indexed market tracks it linearly plus stationary noise,
//! so every (even, odd) neighbour pair is cointegrated by construction.

use super::{Candle, ExchangeError, MarketDataSource, MarketInfo, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BASE_ASSETS: [&str; 12] = [
    "BTC", "ETH", "SOL", "BNB", "XRP", "ADA", "DOGE", "AVAX", "LINK", "DOT", "LTC", "ATOM",
];

/// Shape of the generated universe
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub num_markets: usize,
    pub num_bars: usize,
    pub seed: u64,
    pub quote: String,
    /// Add a market whose price never moves
    pub include_constant: bool,
    /// Add a market with one bar missing in the middle of its history
    pub include_gapped: bool,
    /// Make primary liquidity lookups fail for odd-indexed markets
    pub flaky_primary: bool,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_markets: 8,
            num_bars: 540,
            seed: 42,
            quote: "USDT".to_string(),
            include_constant: false,
            include_gapped: false,
            flaky_primary: false,
        }
    }
}

#[derive(Debug, Clone)]
struct SyntheticAsset {
    info: MarketInfo,
    closes: Vec<f64>,
    missing_bar: Option<usize>,
    quote_volume: f64,
    open_interest: f64,
}

pub struct SyntheticMarket {
    assets: Vec<SyntheticAsset>,
    flaky_primary: bool,
}

fn random_walk(rng: &mut StdRng, start: f64, len: usize) -> Vec<f64> {
    let mut price = start;
    (0..len)
        .map(|_| {
            price = (price + rng.random_range(-1.0..1.0)).max(1.0);
            price
        })
        .collect()
}

impl SyntheticMarket {
    pub fn new(config: SyntheticConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut assets: Vec<SyntheticAsset> = Vec::new();

        for i in 0..config.num_markets {
            let base = BASE_ASSETS
                .get(i)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("SYN{}", i));
            let closes = if i % 2 == 1 {
                let leader = &assets[i - 1].closes;
                let slope = rng.random_range(0.5..2.0);
                let intercept = rng.random_range(5.0..50.0);
                leader
                    .iter()
                    .map(|p| intercept + slope * p + rng.random_range(-0.5..0.5))
                    .collect()
            } else {
                let start = rng.random_range(200.0..2_000.0);
                random_walk(&mut rng, start, config.num_bars)
            };
            assets.push(SyntheticAsset {
                info: MarketInfo::new(&base, &config.quote),
                closes,
                missing_bar: None,
                quote_volume: rng.random_range(1.0e7..1.0e9),
                open_interest: rng.random_range(1.0e6..1.0e8),
            });
        }

        if config.include_constant {
            assets.push(SyntheticAsset {
                info: MarketInfo::new("FLAT", &config.quote),
                closes: vec![1.0; config.num_bars],
                missing_bar: None,
                quote_volume: 5.0e7,
                open_interest: 5.0e6,
            });
        }

        if config.include_gapped {
            let closes = random_walk(&mut rng, 500.0, config.num_bars);
            assets.push(SyntheticAsset {
                info: MarketInfo::new("GAPS", &config.quote),
                closes,
                missing_bar: Some(config.num_bars / 2),
                quote_volume: 5.0e7,
                open_interest: 5.0e6,
            });
        }

        Self {
            assets,
            flaky_primary: config.flaky_primary,
        }
    }

    pub fn markets(&self) -> Vec<MarketInfo> {
        self.assets.iter().map(|a| a.info.clone()).collect()
    }

    fn asset(&self, market_id: &str) -> Result<(usize, &SyntheticAsset), ExchangeError> {
        self.assets
            .iter()
            .enumerate()
            .find(|(_, a)| a.info.id == market_id)
            .ok_or_else(|| ExchangeError::UnknownMarket(market_id.to_string()))
    }

    fn primary(&self, market_id: &str) -> Result<&SyntheticAsset, ExchangeError> {
        let (index, asset) = self.asset(market_id)?;
        if self.flaky_primary && index % 2 == 1 {
            return Err(ExchangeError::Status {
                endpoint: "synthetic".to_string(),
                status: 503,
                body: format!("primary lookup unavailable for {}", market_id),
            });
        }
        Ok(asset)
    }
}

#[async_trait]
impl MarketDataSource for SyntheticMarket {
    async fn load_markets(&self, quote: &str) -> Result<Vec<MarketInfo>, ExchangeError> {
        Ok(self
            .assets
            .iter()
            .filter(|a| a.info.quote.eq_ignore_ascii_case(quote))
            .map(|a| a.info.clone())
            .collect())
    }

    async fn fetch_candles(
        &self,
        market: &MarketInfo,
        timeframe: Timeframe,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let (_, asset) = self.asset(&market.id)?;
        let step = Duration::seconds(timeframe.seconds());
        Ok(asset
            .closes
            .iter()
            .take(limit)
            .enumerate()
            .filter(|(i, _)| Some(*i) != asset.missing_bar)
            .map(|(i, close)| Candle {
                timestamp: since + step * i as i32,
                close: *close,
            })
            .collect())
    }

    async fn daily_quote_volume(&self, market_id: &str) -> Result<f64, ExchangeError> {
        Ok(self.primary(market_id)?.quote_volume)
    }

    async fn daily_quote_volume_fallback(&self, market_id: &str) -> Result<f64, ExchangeError> {
        Ok(self.asset(market_id)?.1.quote_volume)
    }

    async fn open_interest(&self, market_id: &str) -> Result<f64, ExchangeError> {
        Ok(self.primary(market_id)?.open_interest)
    }

    async fn open_interest_fallback(&self, market_id: &str) -> Result<f64, ExchangeError> {
        Ok(self.asset(market_id)?.1.open_interest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn since() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_same_seed_same_prices() {
        let a = SyntheticMarket::new(SyntheticConfig::default());
        let b = SyntheticMarket::new(SyntheticConfig::default());
        assert_eq!(a.assets[3].closes, b.assets[3].closes);
    }

    #[tokio::test]
    async fn test_candles_are_evenly_spaced() {
        let market = SyntheticMarket::new(SyntheticConfig::default());
        let info = market.markets()[0].clone();
        let candles = market
            .fetch_candles(&info, Timeframe::FourHour, since(), 100)
            .await
            .unwrap();
        assert_eq!(candles.len(), 100);
        for w in candles.windows(2) {
            assert_eq!((w[1].timestamp - w[0].timestamp).num_seconds(), 14_400);
        }
    }

    #[tokio::test]
    async fn test_gapped_market_misses_one_bar() {
        let market = SyntheticMarket::new(SyntheticConfig {
            num_markets: 2,
            num_bars: 60,
            include_gapped: true,
            ..Default::default()
        });
        let gapped = MarketInfo::new("GAPS", "USDT");
        let candles = market
            .fetch_candles(&gapped, Timeframe::OneHour, since(), 60)
            .await
            .unwrap();
        assert_eq!(candles.len(), 59);
    }

    #[tokio::test]
    async fn test_flaky_primary_has_working_fallback() {
        let market = SyntheticMarket::new(SyntheticConfig {
            flaky_primary: true,
            ..Default::default()
        });
        let ids: Vec<String> = market.markets().into_iter().map(|m| m.id).collect();
        assert!(market.daily_quote_volume(&ids[0]).await.is_ok());
        assert!(market.daily_quote_volume(&ids[1]).await.is_err());
        assert!(market.daily_quote_volume_fallback(&ids[1]).await.is_ok());
        assert!(market.open_interest(&ids[1]).await.is_err());
        assert!(market.open_interest_fallback(&ids[1]).await.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_unknown_market() {
        let market = SyntheticMarket::new(SyntheticConfig::default());
        assert!(matches!(
            market.open_interest("NOPEUSDT").await,
            Err(ExchangeError::UnknownMarket(_))
        ));
    }
}
