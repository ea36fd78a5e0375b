//! CSV report and lookup line formatting.
//!
//! Output contract: p-values at 4 decimal places, scores at 2.

use super::screener::PairResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: &str = "Pair,P-Value,Score";

pub fn format_pvalue(p: f64) -> String {
    format!("{:.4}", p)
}

pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// CSV row: `A-B,<p>,<score>`
pub fn csv_row(pair: &PairResult) -> String {
    format!(
        "{},{},{}",
        pair.label(),
        format_pvalue(pair.p_value),
        format_score(pair.statistic)
    )
}

/// `A - B: p-value=<p>, score=<score>`
pub fn format_lookup_line(pair: &PairResult) -> String {
    format!(
        "{} - {}: p-value={}, score={}",
        pair.symbol_a,
        pair.symbol_b,
        format_pvalue(pair.p_value),
        format_score(pair.statistic)
    )
}

/// Write `pairs` to `path`, replacing any existing file.
///
/// Nothing is written when `pairs` is empty. Returns the number of rows.
pub fn write_top_pairs_csv(path: impl AsRef<Path>, pairs: &[PairResult]) -> std::io::Result<usize> {
    if pairs.is_empty() {
        return Ok(0);
    }
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", CSV_HEADER)?;
    for pair in pairs {
        writeln!(out, "{}", csv_row(pair))?;
    }
    out.flush()?;
    Ok(pairs.len())
}
