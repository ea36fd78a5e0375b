//! Market universe construction: load, filter by liquidity, fetch, align.

use super::config::ScreenConfig;
use super::error::ScreenError;
use super::series::{Series, SeriesMatrix};
use crate::exchange::{MarketDataSource, MarketInfo};
use chrono::{Duration as ChronoDuration, Utc};
use tracing::{debug, error, info, warn};

/// Result of building the universe
#[derive(Debug, Clone)]
pub struct UniverseOutcome {
    pub matrix: SeriesMatrix,
    /// Markets with positive open interest
    pub markets_loaded: usize,
    /// Markets that passed the liquidity filter
    pub markets_liquid: usize,
    /// Markets whose price history was fetched
    pub series_fetched: usize,
}

/// 24h quote volume: primary endpoint, then fallback, then 0
pub async fn quote_volume<S>(source: &S, market_id: &str) -> f64
where
    S: MarketDataSource + ?Sized,
{
    match source.daily_quote_volume(market_id).await {
        Ok(v) => v,
        Err(e) => {
            warn!(market = market_id, error = %e, "Volume lookup failed, trying fallback");
            source
                .daily_quote_volume_fallback(market_id)
                .await
                .unwrap_or_else(|e2| {
                    error!(market = market_id, error = %e2, "Fallback volume lookup failed");
                    0.0
                })
        }
    }
}

/// Open interest: primary endpoint, then fallback, then 0
pub async fn open_interest<S>(source: &S, market_id: &str) -> f64
where
    S: MarketDataSource + ?Sized,
{
    match source.open_interest(market_id).await {
        Ok(v) => v,
        Err(e) => {
            warn!(market = market_id, error = %e, "Open interest lookup failed, trying fallback");
            source
                .open_interest_fallback(market_id)
                .await
                .unwrap_or_else(|e2| {
                    error!(market = market_id, error = %e2, "Fallback open interest lookup failed");
                    0.0
                })
        }
    }
}

/// Markets quoted in the configured currency with open interest above zero
async fn load_active_markets<S>(source: &S, config: &ScreenConfig) -> Result<Vec<MarketInfo>, ScreenError>
where
    S: MarketDataSource + ?Sized,
{
    let markets = source.load_markets(&config.quote_currency).await?;
    let mut active = Vec::with_capacity(markets.len());
    for market in markets {
        let oi = open_interest(source, &market.id).await;
        if oi > 0.0 {
            active.push(market);
        } else {
            debug!(market = %market.id, "No open interest, skipping");
        }
    }
    Ok(active)
}

async fn apply_liquidity_filter<S>(
    source: &S,
    config: &ScreenConfig,
    markets: Vec<MarketInfo>,
) -> Vec<MarketInfo>
where
    S: MarketDataSource + ?Sized,
{
    let filter = config.liquidity_filter;
    if !filter.uses_volume() && !filter.uses_open_interest() {
        return markets;
    }

    let mut liquid = Vec::with_capacity(markets.len());
    for market in markets {
        if filter.uses_volume() {
            let volume = quote_volume(source, &market.id).await;
            if volume <= config.volume_floor() {
                debug!(market = %market.id, volume, floor = config.volume_floor(), "Below volume floor");
                continue;
            }
        }
        if filter.uses_open_interest() {
            let oi = open_interest(source, &market.id).await;
            if oi <= config.min_open_interest {
                debug!(market = %market.id, open_interest = oi, "Below open interest floor");
                continue;
            }
        }
        liquid.push(market);
    }
    liquid
}

/// Build the aligned price matrix for a run.
///
/// Price history is fetched one market at a time; rate limiting is the
/// data source's job.
///
/// # Errors
/// `NoMarkets`, `NoLiquidMarkets` or `NoPriceData` when a stage leaves
/// nothing to work with, `Exchange` when the market list cannot be loaded.
pub async fn build_universe<S>(source: &S, config: &ScreenConfig) -> Result<UniverseOutcome, ScreenError>
where
    S: MarketDataSource + ?Sized,
{
    let markets = load_active_markets(source, config).await?;
    info!(markets = markets.len(), quote = %config.quote_currency, "Initial markets");
    if markets.is_empty() {
        return Err(ScreenError::NoMarkets);
    }
    let markets_loaded = markets.len();

    let liquid = apply_liquidity_filter(source, config, markets).await;
    info!(
        markets = liquid.len(),
        filter = %config.liquidity_filter,
        "After liquidity filter"
    );
    if liquid.is_empty() {
        return Err(ScreenError::NoLiquidMarkets {
            filter: config.liquidity_filter.to_string(),
        });
    }
    let markets_liquid = liquid.len();

    let since = Utc::now() - ChronoDuration::days(config.lookback_days as i64);
    let limit = config.bars_requested();
    let interval_ms = config.timeframe.millis();
    info!(
        markets = liquid.len(),
        timeframe = %config.timeframe,
        bars = limit,
        since = %since.format("%Y-%m-%d %H:%M"),
        "Fetching price history"
    );

    let mut series = Vec::with_capacity(liquid.len());
    for market in &liquid {
        let candles = match source
            .fetch_candles(market, config.timeframe, since, limit)
            .await
        {
            Ok(c) if c.is_empty() => {
                warn!(symbol = %market.symbol, "No candles received");
                continue;
            }
            Ok(c) => c,
            Err(e) => {
                warn!(symbol = %market.symbol, error = %e, "Candle fetch failed, skipping");
                continue;
            }
        };

        let s = match Series::from_candles(market.symbol.clone(), &candles) {
            Ok(s) => s,
            Err(e) => {
                warn!(symbol = %market.symbol, error = %e, "Invalid price series, skipping");
                continue;
            }
        };

        let gaps = s.gaps(interval_ms);
        if !gaps.is_empty() {
            warn!(
                symbol = %market.symbol,
                gaps = gaps.len(),
                missing_bars = gaps.iter().map(|g| g.missing).sum::<usize>(),
                "Price history has gaps"
            );
        }
        debug!(symbol = %market.symbol, bars = s.len(), "Fetched candles");
        series.push(s);
    }

    if series.is_empty() {
        return Err(ScreenError::NoPriceData);
    }
    let series_fetched = series.len();

    let matrix = SeriesMatrix::align(series);
    let (rows, columns) = matrix.shape();
    info!(rows, columns, dropped = matrix.dropped().len(), "Aligned data shape");

    Ok(UniverseOutcome {
        matrix,
        markets_loaded,
        markets_liquid,
        series_fetched,
    })
}
