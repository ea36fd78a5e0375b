//! Error types for the discovery module

use crate::exchange::ExchangeError;
use thiserror::Error;

/// Errors that can occur while building the universe or screening pairs
#[derive(Error, Debug)]
pub enum ScreenError {
    /// Fewer than two eligible series to form a pair
    #[error("Insufficient columns: need at least 2 aligned series, got {found}")]
    InsufficientColumns { found: usize },

    /// A single pairwise job failed unexpectedly (logged, never fatal)
    #[error("Execution failure for pair {pair}: {reason}")]
    ExecutionFailure { pair: String, reason: String },

    /// The data source returned no tradable markets
    #[error("No markets found")]
    NoMarkets,

    /// Every market was removed by the liquidity filter
    #[error("No markets passed liquidity filter ({filter})")]
    NoLiquidMarkets { filter: String },

    /// No price history could be fetched for any market
    #[error("No OHLCV data fetched")]
    NoPriceData,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Market data source error
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors constructing a [`Series`](super::series::Series)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// Timestamps and values differ in length
    #[error("Length mismatch for {symbol}: {timestamps} timestamps, {values} values")]
    LengthMismatch {
        symbol: String,
        timestamps: usize,
        values: usize,
    },

    /// Timestamps are not strictly increasing
    #[error("Timestamps for {symbol} are not strictly increasing at index {index}")]
    NonMonotonicTimestamps { symbol: String, index: usize },
}
