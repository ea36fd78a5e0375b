//! Merge of defaults, JSON file and CLI flags into a [`ScreenConfig`].

use super::ScreenArgs;
use crate::discovery::{ScreenConfig, ScreenError};

/// Defaults, then `--config`, then explicit flags. The liquidity filter is
/// left to the caller because it may need a prompt.
pub fn resolve_config(args: &ScreenArgs) -> Result<ScreenConfig, ScreenError> {
    let mut config = match &args.config {
        Some(path) => ScreenConfig::from_json_file(path)?,
        None => ScreenConfig::default(),
    };

    if let Some(timeframe) = args.timeframe {
        config.timeframe = timeframe;
    }
    if let Some(days) = args.lookback_days {
        config.lookback_days = days;
    }
    if let Some(threshold) = args.threshold {
        config.coint_threshold = threshold;
    }
    if let Some(top_n) = args.top_n {
        config.top_n_pairs = top_n;
    }
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if let Some(min_points) = args.min_data_points {
        config.min_data_points = min_points;
    }
    if let Some(criterion) = args.lag_criterion {
        config.lag_criterion = criterion;
    }
    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }
    if let Some(filter) = args.filter {
        config.liquidity_filter = filter;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::LiquidityFilter;
    use crate::exchange::Timeframe;
    use std::io::Write;

    #[test]
    fn test_defaults_without_flags() {
        let config = resolve_config(&ScreenArgs::default()).unwrap();
        assert_eq!(config.coint_threshold, 0.05);
        assert_eq!(config.liquidity_filter, LiquidityFilter::None);
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeframe": "1d", "top_n_pairs": 3, "max_workers": 2}}"#).unwrap();

        let args = ScreenArgs {
            config: Some(file.path().to_path_buf()),
            top_n: Some(5),
            filter: Some(LiquidityFilter::Both),
            ..Default::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.timeframe, Timeframe::OneDay);
        assert_eq!(config.top_n_pairs, 5);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.liquidity_filter, LiquidityFilter::Both);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let args = ScreenArgs {
            config: Some("/nonexistent/pairscan.json".into()),
            ..Default::default()
        };
        assert!(matches!(resolve_config(&args), Err(ScreenError::Io(_))));
    }
}
