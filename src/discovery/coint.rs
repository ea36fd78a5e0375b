//! Engle-Granger two-step cointegration test.
//!
//! 1. Regress `y` on `[1, x]` by OLS.
//! 2. Run an ADF test on the residual with no deterministic term (the
//!    intercept has already demeaned it) and read the p-value from the
//!    two-series MacKinnon surface with constant.
//!
//! A small p-value rejects "no cointegration".

use crate::math::adf::is_constant;
use crate::math::mackinnon::Deterministic;
use crate::math::{simple_regression, test_unit_root, UnitRootSettings};
use tracing::debug;

/// Number of series in a pairwise cointegrating regression
const PAIR_SERIES: usize = 2;

/// Settings for a pairwise test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CointSettings {
    /// Both series must have at least this many points
    pub min_data_points: usize,
    /// Lag criterion and max-lag override for the residual test.
    /// The deterministic term and series count are fixed by the test.
    pub unit_root: UnitRootSettings,
}

impl Default for CointSettings {
    fn default() -> Self {
        Self {
            min_data_points: 50,
            unit_root: UnitRootSettings::default(),
        }
    }
}

/// Outcome of a pairwise test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CointResult {
    /// ADF t-statistic of the residual (−∞ for an exact linear relation)
    pub statistic: f64,
    pub pvalue: f64,
}

/// `1 − R²` below this means `y` is an exact linear function of `x`
fn collinearity_bound() -> f64 {
    100.0 * f64::EPSILON.sqrt()
}

/// Test `y` and `x` for cointegration.
///
/// Returns `None` when the pair cannot be tested: unequal lengths, too
/// few points, a constant series or a failed residual test.
pub fn test_cointegration(y: &[f64], x: &[f64], settings: &CointSettings) -> Option<CointResult> {
    if y.len() != x.len() {
        debug!(y_len = y.len(), x_len = x.len(), "Series length mismatch");
        return None;
    }
    if y.len() < settings.min_data_points {
        debug!(
            len = y.len(),
            min = settings.min_data_points,
            "Not enough data points"
        );
        return None;
    }
    if is_constant(y) || is_constant(x) {
        debug!("Constant series cannot be tested");
        return None;
    }

    let fit = match simple_regression(y, x) {
        Ok(fit) => fit,
        Err(e) => {
            debug!(error = %e, "Cointegrating regression failed");
            return None;
        }
    };

    if 1.0 - fit.r_squared() < collinearity_bound() {
        debug!(r_squared = fit.r_squared(), "Series are collinear");
        return Some(CointResult {
            statistic: f64::NEG_INFINITY,
            pvalue: 0.0,
        });
    }

    let residual_settings = UnitRootSettings {
        deterministic: Deterministic::None,
        num_series: PAIR_SERIES,
        pvalue_deterministic: Some(Deterministic::Constant),
        ..settings.unit_root
    };
    let adf = match test_unit_root(fit.residuals(), &residual_settings) {
        Ok(adf) => adf,
        Err(e) => {
            debug!(error = %e, "Residual unit-root test failed");
            return None;
        }
    };

    Some(CointResult {
        statistic: adf.statistic,
        pvalue: adf.pvalue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_walk(rng: &mut StdRng, n: usize) -> Vec<f64> {
        let mut level = 100.0;
        (0..n)
            .map(|_| {
                level += rng.random_range(-1.0..1.0);
                level
            })
            .collect()
    }

    #[test]
    fn test_cointegrated_pair_is_significant() {
        let mut rng = StdRng::seed_from_u64(7);
        let x = random_walk(&mut rng, 400);
        let y: Vec<f64> = x
            .iter()
            .map(|v| 3.0 + 1.5 * v + rng.random_range(-0.5..0.5))
            .collect();
        let result = test_cointegration(&y, &x, &CointSettings::default()).unwrap();
        assert!(result.pvalue < 0.01, "p = {}", result.pvalue);
        assert!(result.statistic < -3.9);
    }

    #[test]
    fn test_independent_walks_mostly_not_significant() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut rejected = 0;
        for _ in 0..10 {
            let x = random_walk(&mut rng, 300);
            let y = random_walk(&mut rng, 300);
            if let Some(r) = test_cointegration(&y, &x, &CointSettings::default()) {
                if r.pvalue < 0.05 {
                    rejected += 1;
                }
            }
        }
        assert!(rejected <= 3, "{} of 10 spuriously cointegrated", rejected);
    }

    #[test]
    fn test_exact_linear_relation_is_collinear() {
        let mut rng = StdRng::seed_from_u64(3);
        let x = random_walk(&mut rng, 100);
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let result = test_cointegration(&y, &x, &CointSettings::default()).unwrap();
        assert_eq!(result.statistic, f64::NEG_INFINITY);
        assert_eq!(result.pvalue, 0.0);
    }

    #[test]
    fn test_constant_series_skipped() {
        let mut rng = StdRng::seed_from_u64(5);
        let x = random_walk(&mut rng, 100);
        let y = vec![42.0; 100];
        assert!(test_cointegration(&y, &x, &CointSettings::default()).is_none());
        assert!(test_cointegration(&x, &y, &CointSettings::default()).is_none());
    }

    #[test]
    fn test_short_or_mismatched_series_skipped() {
        let mut rng = StdRng::seed_from_u64(9);
        let x = random_walk(&mut rng, 40);
        let y = random_walk(&mut rng, 40);
        assert!(test_cointegration(&y, &x, &CointSettings::default()).is_none());
        assert!(test_cointegration(&y[..39], &x, &CointSettings::default()).is_none());
    }

    #[test]
    fn test_pvalue_read_from_constant_surface() {
        let mut rng = StdRng::seed_from_u64(19);
        let x = random_walk(&mut rng, 250);
        let y: Vec<f64> = x
            .iter()
            .map(|v| 0.5 * v + rng.random_range(-2.0..2.0))
            .collect();
        let result = test_cointegration(&y, &x, &CointSettings::default()).unwrap();
        assert_eq!(
            result.pvalue,
            crate::math::mackinnon::pvalue(result.statistic, Deterministic::Constant, PAIR_SERIES)
        );
    }

    #[test]
    fn test_pure_function() {
        let mut rng = StdRng::seed_from_u64(13);
        let x = random_walk(&mut rng, 200);
        let y = random_walk(&mut rng, 200);
        let a = test_cointegration(&y, &x, &CointSettings::default());
        let b = test_cointegration(&y, &x, &CointSettings::default());
        assert_eq!(a, b);
    }
}
