//! Configuration for a screening run

use super::error::ScreenError;
use super::screener::ScreenSettings;
use crate::exchange::Timeframe;
use crate::math::{LagCriterion, UnitRootSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which liquidity checks a market must pass before its prices are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiquidityFilter {
    #[default]
    None,
    Volume,
    OpenInterest,
    Both,
}

impl LiquidityFilter {
    /// Interpret an answer to the interactive filter prompt.
    ///
    /// `v` selects volume, `oi` open interest, `b` or `y` both. Anything
    /// else, including an empty line, disables filtering.
    pub fn from_choice(choice: &str) -> Self {
        match choice.trim().to_lowercase().as_str() {
            "v" => LiquidityFilter::Volume,
            "oi" => LiquidityFilter::OpenInterest,
            "b" | "y" => LiquidityFilter::Both,
            _ => LiquidityFilter::None,
        }
    }

    pub fn uses_volume(self) -> bool {
        matches!(self, LiquidityFilter::Volume | LiquidityFilter::Both)
    }

    pub fn uses_open_interest(self) -> bool {
        matches!(self, LiquidityFilter::OpenInterest | LiquidityFilter::Both)
    }
}

impl std::fmt::Display for LiquidityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LiquidityFilter::None => "none",
            LiquidityFilter::Volume => "volume",
            LiquidityFilter::OpenInterest => "open-interest",
            LiquidityFilter::Both => "both",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for LiquidityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v" | "volume" => Ok(LiquidityFilter::Volume),
            "oi" | "open-interest" => Ok(LiquidityFilter::OpenInterest),
            "b" | "y" | "both" => Ok(LiquidityFilter::Both),
            "none" | "n" => Ok(LiquidityFilter::None),
            _ => Err(format!(
                "Unknown liquidity filter: '{}'. Valid options: v, oi, b, y, none",
                s
            )),
        }
    }
}

/// Parameters of a screening run.
///
/// Built once at startup from defaults, an optional JSON file and CLI
/// overrides, then validated and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Sampling interval of the price series
    #[serde(default)]
    pub timeframe: Timeframe,

    /// Historical lookback period in days
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Pairs with p-value strictly below this are kept
    #[serde(default = "default_coint_threshold")]
    pub coint_threshold: f64,

    /// Number of pairs written to the CSV
    #[serde(default = "default_top_n_pairs")]
    pub top_n_pairs: usize,

    /// Screening worker threads
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Minimum series length for a pair to be tested
    #[serde(default = "default_min_data_points")]
    pub min_data_points: usize,

    /// Lag selection rule for the residual unit-root test
    #[serde(default)]
    pub lag_criterion: LagCriterion,

    /// Overrides the Schwert rule for the largest lag considered
    #[serde(default)]
    pub max_lag: Option<usize>,

    /// Quote asset of the market universe
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,

    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Volume filter base; a market passes when its 24h quote volume
    /// exceeds `min_volume / 14`
    #[serde(default = "default_min_volume")]
    pub min_volume: f64,

    /// Open interest filter threshold
    #[serde(default = "default_min_open_interest")]
    pub min_open_interest: f64,

    #[serde(default)]
    pub liquidity_filter: LiquidityFilter,

    /// Minimum spacing between data-source requests (ms)
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

fn default_lookback_days() -> u32 {
    90
}
fn default_coint_threshold() -> f64 {
    0.05
}
fn default_top_n_pairs() -> usize {
    10
}
fn default_max_workers() -> usize {
    8
}
fn default_min_data_points() -> usize {
    50
}
fn default_quote_currency() -> String {
    "USDT".to_string()
}
fn default_output_file() -> String {
    "pairs_to_trade.csv".to_string()
}
fn default_min_volume() -> f64 {
    500_000_000.0
}
fn default_min_open_interest() -> f64 {
    50_000_000.0
}
fn default_rate_limit_ms() -> u64 {
    100
}

/// Divisor applied to `min_volume` before comparing against 24h volume
pub const VOLUME_DIVISOR: f64 = 14.0;

/// Longest history window accepted, in days
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::default(),
            lookback_days: default_lookback_days(),
            coint_threshold: default_coint_threshold(),
            top_n_pairs: default_top_n_pairs(),
            max_workers: default_max_workers(),
            min_data_points: default_min_data_points(),
            lag_criterion: LagCriterion::default(),
            max_lag: None,
            quote_currency: default_quote_currency(),
            output_file: default_output_file(),
            min_volume: default_min_volume(),
            min_open_interest: default_min_open_interest(),
            liquidity_filter: LiquidityFilter::default(),
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

impl ScreenConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScreenError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// 24h quote volume a market must exceed under the volume filter
    pub fn volume_floor(&self) -> f64 {
        self.min_volume / VOLUME_DIVISOR
    }

    /// Number of bars requested per market
    pub fn bars_requested(&self) -> usize {
        self.timeframe.bars_in_days(self.lookback_days)
    }

    pub fn unit_root_settings(&self) -> UnitRootSettings {
        UnitRootSettings {
            criterion: self.lag_criterion,
            max_lag: self.max_lag,
            ..Default::default()
        }
    }

    pub fn screen_settings(&self) -> ScreenSettings {
        ScreenSettings {
            threshold: self.coint_threshold,
            top_k: self.top_n_pairs,
            parallelism: self.max_workers,
            min_data_points: self.min_data_points,
            unit_root: self.unit_root_settings(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.coint_threshold > 0.0 && self.coint_threshold <= 1.0) {
            return Err(format!(
                "coint_threshold must be in (0, 1], got {}",
                self.coint_threshold
            ));
        }
        if self.top_n_pairs == 0 {
            return Err("top_n_pairs must be at least 1".to_string());
        }
        if self.max_workers == 0 {
            return Err("max_workers must be at least 1".to_string());
        }
        if self.min_data_points < 10 {
            return Err(format!(
                "min_data_points must be at least 10, got {}",
                self.min_data_points
            ));
        }
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(format!(
                "lookback_days must be in 1..={}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            ));
        }
        if !(self.min_volume >= 0.0) {
            return Err(format!("min_volume cannot be negative, got {}", self.min_volume));
        }
        if !(self.min_open_interest >= 0.0) {
            return Err(format!(
                "min_open_interest cannot be negative, got {}",
                self.min_open_interest
            ));
        }
        if self.quote_currency.trim().is_empty() {
            return Err("quote_currency cannot be empty".to_string());
        }
        if self.rate_limit_ms == 0 {
            return Err("rate_limit_ms must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScreenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeframe, Timeframe::FourHour);
        assert_eq!(config.output_file, "pairs_to_trade.csv");
        assert_eq!(config.bars_requested(), 540);
    }

    #[test]
    fn test_invalid_threshold() {
        for threshold in [0.0, -0.1, 1.5, f64::NAN] {
            let config = ScreenConfig {
                coint_threshold: threshold,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "threshold {}", threshold);
        }
        let config = ScreenConfig {
            coint_threshold: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_counts_invalid() {
        let config = ScreenConfig {
            top_n_pairs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = ScreenConfig {
            max_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = ScreenConfig {
            min_data_points: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = ScreenConfig {
            rate_limit_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lookback_days_bounds() {
        for days in [0, MAX_LOOKBACK_DAYS + 1, u32::MAX] {
            let config = ScreenConfig {
                lookback_days: days,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "lookback_days {}", days);
        }
        let config = ScreenConfig {
            lookback_days: MAX_LOOKBACK_DAYS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_filter_thresholds_invalid() {
        let config = ScreenConfig {
            min_volume: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = ScreenConfig {
            min_open_interest: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_volume_floor() {
        let config = ScreenConfig::default();
        assert!((config.volume_floor() - 500_000_000.0 / 14.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"timeframe": "1h", "coint_threshold": 0.01, "liquidity_filter": "open-interest"}}"#
        )
        .unwrap();

        let config = ScreenConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.timeframe, Timeframe::OneHour);
        assert_eq!(config.coint_threshold, 0.01);
        assert_eq!(config.liquidity_filter, LiquidityFilter::OpenInterest);
        assert_eq!(config.top_n_pairs, 10);
        assert_eq!(config.lag_criterion, LagCriterion::Bic);
    }

    #[test]
    fn test_bad_json_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeframe": "7h"}}"#).unwrap();
        assert!(matches!(
            ScreenConfig::from_json_file(file.path()),
            Err(ScreenError::Json(_))
        ));
    }

    #[test]
    fn test_filter_choice() {
        assert_eq!(LiquidityFilter::from_choice("v"), LiquidityFilter::Volume);
        assert_eq!(LiquidityFilter::from_choice(" OI "), LiquidityFilter::OpenInterest);
        assert_eq!(LiquidityFilter::from_choice("b"), LiquidityFilter::Both);
        assert_eq!(LiquidityFilter::from_choice("y"), LiquidityFilter::Both);
        assert_eq!(LiquidityFilter::from_choice(""), LiquidityFilter::None);
        assert_eq!(LiquidityFilter::from_choice("maybe"), LiquidityFilter::None);
    }

    #[test]
    fn test_filter_from_str_is_strict() {
        assert_eq!("both".parse::<LiquidityFilter>().unwrap(), LiquidityFilter::Both);
        assert_eq!("none".parse::<LiquidityFilter>().unwrap(), LiquidityFilter::None);
        assert!("maybe".parse::<LiquidityFilter>().is_err());
    }
}
