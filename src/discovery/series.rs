//! Price series and the aligned matrix the screener consumes

use super::error::SeriesError;
use crate::exchange::Candle;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// A named close-price series with strictly increasing timestamps (epoch ms)
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    symbol: String,
    timestamps: Vec<i64>,
    values: Vec<f64>,
}

/// A run of missing bars between two consecutive samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    /// Timestamp of the last sample before the gap
    pub after: i64,
    /// Timestamp of the first sample after the gap
    pub before: i64,
    /// Number of bars that should have been present
    pub missing: usize,
}

impl Series {
    pub fn new(
        symbol: impl Into<String>,
        timestamps: Vec<i64>,
        values: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if timestamps.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                symbol,
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }
        if let Some(index) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SeriesError::NonMonotonicTimestamps {
                symbol,
                index: index + 1,
            });
        }
        Ok(Self {
            symbol,
            timestamps,
            values,
        })
    }

    pub fn from_candles(symbol: impl Into<String>, candles: &[Candle]) -> Result<Self, SeriesError> {
        let (timestamps, values) = candles
            .iter()
            .map(|c| (c.timestamp.timestamp_millis(), c.close))
            .unzip();
        Self::new(symbol, timestamps, values)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Holes in the series relative to a fixed sampling interval
    pub fn gaps(&self, interval_ms: i64) -> Vec<Gap> {
        if interval_ms <= 0 {
            return Vec::new();
        }
        self.timestamps
            .windows(2)
            .filter_map(|w| {
                let step = w[1] - w[0];
                (step > interval_ms).then(|| Gap {
                    after: w[0],
                    before: w[1],
                    missing: (step / interval_ms - 1) as usize,
                })
            })
            .collect()
    }
}

/// Rectangular matrix of aligned series sharing one timestamp index.
///
/// Column order is the order in which series were supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesMatrix {
    timestamps: Vec<i64>,
    symbols: Vec<String>,
    columns: Vec<Vec<f64>>,
    dropped: Vec<String>,
}

impl SeriesMatrix {
    /// Align series on the union of their timestamps.
    ///
    /// A series missing any timestamp of the union is dropped entirely
    /// rather than imputed, as is an empty series. Duplicate symbols keep
    /// their first occurrence.
    pub fn align(series: Vec<Series>) -> Self {
        let union: BTreeSet<i64> = series
            .iter()
            .flat_map(|s| s.timestamps.iter().copied())
            .collect();
        let timestamps: Vec<i64> = union.into_iter().collect();

        let mut seen = HashSet::new();
        let mut symbols = Vec::new();
        let mut columns = Vec::new();
        let mut dropped = Vec::new();

        for s in series {
            if !seen.insert(s.symbol.clone()) {
                warn!(symbol = %s.symbol, "Duplicate series ignored");
                continue;
            }
            // Timestamps are strictly increasing and a subset of the union,
            // so equal length means equal index.
            if !s.is_empty() && s.timestamps.len() == timestamps.len() {
                symbols.push(s.symbol);
                columns.push(s.values);
            } else {
                debug!(
                    symbol = %s.symbol,
                    present = s.timestamps.len(),
                    expected = timestamps.len(),
                    "Dropping series with missing timestamps"
                );
                dropped.push(s.symbol);
            }
        }

        let timestamps = if columns.is_empty() { Vec::new() } else { timestamps };

        Self {
            timestamps,
            symbols,
            columns,
            dropped,
        }
    }

    /// Build directly from equal-length columns sharing `timestamps`
    pub fn from_columns(
        timestamps: Vec<i64>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, SeriesError> {
        let series = columns
            .into_iter()
            .map(|(symbol, values)| Series::new(symbol, timestamps.clone(), values))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::align(series))
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    pub fn column_by_symbol(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.columns[i].as_slice())
    }

    /// Symbols removed during alignment
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.timestamps.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }
}
