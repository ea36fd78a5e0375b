//! `screen` command handler.
//!
//! Resolves configuration, builds the market universe, screens every pair
//! on a blocking worker pool, writes the CSV and optionally serves lookups.

use super::lookup::run_lookup_loop;
use crate::cli::{resolve_config, ScreenArgs};
use crate::discovery::{
    build_universe, write_top_pairs_csv, LiquidityFilter, PairScreener, QueryIndex, ScreenConfig,
    ScreenError,
};
use crate::exchange::{BinanceFuturesClient, MarketDataSource, SyntheticConfig, SyntheticMarket};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::{error, info};

const FILTER_PROMPT: &str = "Select liquidity filter type:\n\
Enter 'v' for volume filter only,\n\
Enter 'oi' for open interest filter only,\n\
Enter 'b' or 'y' for both filters,\n\
or press Enter for no filter: ";

/// Ask once for the liquidity filter; end of input means no filter
pub fn prompt_liquidity_filter<R, W>(mut input: R, mut output: W) -> std::io::Result<LiquidityFilter>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}", FILTER_PROMPT)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(LiquidityFilter::from_choice(&line))
}

fn market_source(
    config: &ScreenConfig,
    synthetic: bool,
) -> Result<Box<dyn MarketDataSource>, ScreenError> {
    if synthetic {
        info!("Using synthetic market data");
        return Ok(Box::new(SyntheticMarket::new(SyntheticConfig {
            num_bars: config.bars_requested(),
            quote: config.quote_currency.clone(),
            include_constant: true,
            include_gapped: true,
            ..Default::default()
        })));
    }
    let client = BinanceFuturesClient::new(Duration::from_millis(config.rate_limit_ms))?;
    Ok(Box::new(client))
}

/// Run the screening pipeline.
///
/// # Errors
/// Returns an error on invalid configuration, when no market survives
/// loading, filtering or fetching, or when fewer than two series align.
/// Finding no significant pair is not an error.
pub async fn run_screen(args: ScreenArgs) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- pairscan: Cointegration Screen ---");

    let mut config = resolve_config(&args)?;
    if args.filter.is_none() {
        config.liquidity_filter = tokio::task::spawn_blocking(|| {
            prompt_liquidity_filter(std::io::stdin().lock(), std::io::stdout())
        })
        .await??;
    }
    config.validate().map_err(ScreenError::InvalidConfig)?;

    info!(
        timeframe = %config.timeframe,
        lookback_days = config.lookback_days,
        threshold = config.coint_threshold,
        top_n = config.top_n_pairs,
        workers = config.max_workers,
        filter = %config.liquidity_filter,
        lag_criterion = %config.lag_criterion,
        "Starting pairs analysis"
    );

    let source = market_source(&config, args.synthetic)?;
    let universe = build_universe(source.as_ref(), &config).await?;

    let settings = config.screen_settings();
    let matrix = universe.matrix;
    let ranked = tokio::task::spawn_blocking(move || PairScreener::new(settings).screen(&matrix))
        .await??;

    if ranked.top_pairs().is_empty() {
        error!("No cointegrated pairs found");
        println!("No cointegrated pairs found");
        return Ok(());
    }

    let output_path = config.output_file.clone();
    let top = ranked.top_pairs().to_vec();
    let written =
        tokio::task::spawn_blocking(move || write_top_pairs_csv(&output_path, &top)).await??;
    info!(pairs = written, path = %config.output_file, "Saved top pairs");

    if args.no_lookup {
        return Ok(());
    }

    let index = QueryIndex::new(&ranked);
    tokio::task::spawn_blocking(move || {
        run_lookup_loop(&index, std::io::stdin().lock(), std::io::stdout())
    })
    .await??;

    Ok(())
}
