//! Cointegrated pair discovery.
//!
//! Pipeline: [`universe`] builds an aligned [`SeriesMatrix`] from a market
//! data source, [`screener`] runs an Engle-Granger test ([`coint`]) on every
//! pair in parallel and ranks the significant ones, [`query`] answers
//! lookups over the ranking and [`report`] writes the CSV.
//!
//! # Example
//!
//! ```ignore
//! use pairscan::discovery::{build_universe, PairScreener, ScreenConfig};
//! use pairscan::exchange::{SyntheticConfig, SyntheticMarket};
//!
//! let config = ScreenConfig::default();
//! let source = SyntheticMarket::new(SyntheticConfig::default());
//! let universe = build_universe(&source, &config).await?;
//! let ranked = PairScreener::new(config.screen_settings()).screen(&universe.matrix)?;
//! ```

pub mod coint;
pub mod config;
pub mod error;
pub mod query;
pub mod report;
pub mod screener;
pub mod series;
pub mod universe;

pub use coint::{test_cointegration, CointResult, CointSettings};
pub use config::{LiquidityFilter, ScreenConfig};
pub use error::{ScreenError, SeriesError};
pub use query::{symbol_root, QueryIndex};
pub use report::{format_lookup_line, format_pvalue, format_score, write_top_pairs_csv};
pub use screener::{screen, PairResult, PairScreener, RankedResults, ScreenSettings};
pub use series::{Series, SeriesMatrix};
pub use universe::{build_universe, UniverseOutcome};
