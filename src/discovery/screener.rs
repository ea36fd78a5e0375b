//! Parallel pairwise screening and ranking.
//!
//! Every unordered pair of columns is tested on a dedicated rayon pool.
//! Results come back in enumeration order regardless of which worker
//! finishes first, so the ranking is reproducible run to run.

use super::coint::{test_cointegration, CointResult, CointSettings};
use super::error::ScreenError;
use super::series::SeriesMatrix;
use crate::math::UnitRootSettings;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info};

/// One tested pair. `symbol_a` precedes `symbol_b` in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub symbol_a: String,
    pub symbol_b: String,
    pub p_value: f64,
    /// Engle-Granger ADF statistic ("score")
    pub statistic: f64,
}

impl PairResult {
    /// `A-B` label used in reports
    pub fn label(&self) -> String {
        format!("{}-{}", self.symbol_a, self.symbol_b)
    }
}

/// Significant pairs sorted ascending by p-value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankedResults {
    pairs: Vec<PairResult>,
    top_k: usize,
}

impl RankedResults {
    /// Every pair that passed the threshold, best first
    pub fn all(&self) -> &[PairResult] {
        &self.pairs
    }

    /// The first `min(top_k, len)` pairs of [`all`](Self::all)
    pub fn top_pairs(&self) -> &[PairResult] {
        &self.pairs[..self.top_k.min(self.pairs.len())]
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

/// Keep pairs with `p_value < threshold` and stable-sort them ascending
pub fn rank(results: Vec<PairResult>, threshold: f64, top_k: usize) -> RankedResults {
    let mut pairs: Vec<PairResult> = results
        .into_iter()
        .filter(|r| r.p_value < threshold)
        .collect();
    pairs.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
    RankedResults { pairs, top_k }
}

/// All unordered index pairs `(i, j)` with `i < j`, `i` varying slowest
pub fn pair_indices(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSettings {
    /// Significance cutoff (strict `<`)
    pub threshold: f64,
    /// Size of the top-pairs view
    pub top_k: usize,
    /// Worker threads
    pub parallelism: usize,
    pub min_data_points: usize,
    pub unit_root: UnitRootSettings,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            top_k: 10,
            parallelism: 8,
            min_data_points: 50,
            unit_root: UnitRootSettings::default(),
        }
    }
}

pub struct PairScreener {
    settings: ScreenSettings,
}

impl PairScreener {
    pub fn new(settings: ScreenSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ScreenSettings {
        &self.settings
    }

    /// Test every pair of columns and rank the significant ones.
    ///
    /// # Errors
    /// `InsufficientColumns` when the matrix has fewer than two columns,
    /// `ThreadPool` when the worker pool cannot be created. A job that
    /// panics is logged and counted as "no result".
    pub fn screen(&self, matrix: &SeriesMatrix) -> Result<RankedResults, ScreenError> {
        self.screen_with(matrix, test_cointegration)
    }

    /// [`screen`](Self::screen) with a custom per-pair test
    fn screen_with<F>(&self, matrix: &SeriesMatrix, test: F) -> Result<RankedResults, ScreenError>
    where
        F: Fn(&[f64], &[f64], &CointSettings) -> Option<CointResult> + Sync,
    {
        let n = matrix.num_columns();
        if n < 2 {
            return Err(ScreenError::InsufficientColumns { found: n });
        }

        let pairs = pair_indices(n);
        let coint = CointSettings {
            min_data_points: self.settings.min_data_points,
            unit_root: self.settings.unit_root,
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.settings.parallelism.max(1))
            .thread_name(|i| format!("screen-{}", i))
            .build()?;

        info!(
            columns = n,
            pairs = pairs.len(),
            workers = self.settings.parallelism,
            "Screening pairs"
        );
        let start = Instant::now();

        let results: Vec<Option<PairResult>> = pool.install(|| {
            pairs
                .par_iter()
                .map(|&(i, j)| run_pair(matrix, i, j, &coint, &test))
                .collect()
        });

        let tested = results.iter().filter(|r| r.is_some()).count();
        let ranked = rank(
            results.into_iter().flatten().collect(),
            self.settings.threshold,
            self.settings.top_k,
        );

        info!(
            tested,
            significant = ranked.len(),
            threshold = self.settings.threshold,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Screening complete"
        );
        Ok(ranked)
    }
}

fn run_pair<F>(
    matrix: &SeriesMatrix,
    i: usize,
    j: usize,
    settings: &CointSettings,
    test: &F,
) -> Option<PairResult>
where
    F: Fn(&[f64], &[f64], &CointSettings) -> Option<CointResult>,
{
    let symbol_a = &matrix.symbols()[i];
    let symbol_b = &matrix.symbols()[j];

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        test(matrix.column(i), matrix.column(j), settings)
    }));

    match outcome {
        Ok(Some(result)) => Some(PairResult {
            symbol_a: symbol_a.clone(),
            symbol_b: symbol_b.clone(),
            p_value: result.pvalue,
            statistic: result.statistic,
        }),
        Ok(None) => {
            debug!(pair = format!("{}-{}", symbol_a, symbol_b), "Pair not testable");
            None
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            let failure = ScreenError::ExecutionFailure {
                pair: format!("{}-{}", symbol_a, symbol_b),
                reason,
            };
            error!(error = %failure, "Pair job failed");
            None
        }
    }
}

/// Screen `matrix` with default test settings
pub fn screen(
    matrix: &SeriesMatrix,
    threshold: f64,
    top_k: usize,
    parallelism: usize,
) -> Result<RankedResults, ScreenError> {
    PairScreener::new(ScreenSettings {
        threshold,
        top_k,
        parallelism,
        ..Default::default()
    })
    .screen(matrix)
}
