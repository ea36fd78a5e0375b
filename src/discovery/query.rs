//! Read-only lookup over a ranking

use super::screener::{PairResult, RankedResults};

/// Quote suffixes stripped from separator-less symbols such as `BTCUSDT`
const QUOTE_SUFFIXES: [&str; 4] = ["USDT", "USDC", "BUSD", "USD"];

/// Base asset of a market symbol.
///
/// `BTC/USDT`, `BTC-USDT` and `BTC/USDT:USDT` all give `BTC`. Without a
/// separator a known quote suffix is removed, so `BTCUSDT` gives `BTC`.
pub fn symbol_root(symbol: &str) -> &str {
    if let Some(idx) = symbol.find(['/', '-', ':']) {
        return &symbol[..idx];
    }
    QUOTE_SUFFIXES
        .iter()
        .find_map(|suffix| {
            symbol
                .strip_suffix(suffix)
                .filter(|root| !root.is_empty())
        })
        .unwrap_or(symbol)
}

/// Lookup index built once from a ranking and never mutated
#[derive(Debug, Clone)]
pub struct QueryIndex {
    pairs: Vec<PairResult>,
}

impl QueryIndex {
    pub fn new(ranked: &RankedResults) -> Self {
        Self {
            pairs: ranked.all().to_vec(),
        }
    }

    /// Every ranked pair, best first
    pub fn list_all(&self) -> &[PairResult] {
        &self.pairs
    }

    /// Pairs where either leg has base asset `root` (case-insensitive),
    /// in ranked order
    pub fn find_by_symbol(&self, root: &str) -> Vec<&PairResult> {
        let root = root.trim();
        self.pairs
            .iter()
            .filter(|p| {
                symbol_root(&p.symbol_a).eq_ignore_ascii_case(root)
                    || symbol_root(&p.symbol_b).eq_ignore_ascii_case(root)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
