//! CLI argument parsing using clap.

mod config;

pub use config::resolve_config;

use crate::discovery::LiquidityFilter;
use crate::exchange::Timeframe;
use crate::math::LagCriterion;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// pairscan - cointegrated pair screener for perpetual futures
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,

    /// File that receives a copy of the log output
    #[arg(long, global = true, default_value = "pairs_trading.log")]
    pub log_file: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Screen the market universe for cointegrated pairs
    Screen(ScreenArgs),
}

/// Arguments of the `screen` subcommand. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ScreenArgs {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Liquidity filter: v (volume), oi (open interest), b/y (both), none.
    /// Prompted for when omitted.
    #[arg(long)]
    pub filter: Option<LiquidityFilter>,
    /// Candle interval (1m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 12h, 1d)
    #[arg(long)]
    pub timeframe: Option<Timeframe>,
    /// Historical lookback period in days
    #[arg(long)]
    pub lookback_days: Option<u32>,
    /// Keep pairs with p-value below this
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Number of pairs written to the CSV
    #[arg(long)]
    pub top_n: Option<usize>,
    /// Screening worker threads
    #[arg(long)]
    pub workers: Option<usize>,
    /// Minimum series length for a pair to be tested
    #[arg(long)]
    pub min_data_points: Option<usize>,
    /// Lag selection for the residual ADF test: aic, bic or fixed
    #[arg(long)]
    pub lag_criterion: Option<LagCriterion>,
    /// CSV output path
    #[arg(long)]
    pub output: Option<String>,
    /// Use the built-in synthetic market instead of Binance
    #[arg(long, default_value_t = false)]
    pub synthetic: bool,
    /// Exit after writing the CSV instead of starting the lookup prompt
    #[arg(long, default_value_t = false)]
    pub no_lookup: bool,
}
