//! MacKinnon (1994) approximate asymptotic p-values for Dickey-Fuller
//! type t-statistics.
//!
//! The p-value is `Φ(a₀ + a₁τ + a₂τ² [+ a₃τ³])`, with one coefficient set
//! for the lower tail (τ ≤ τ*) and another for the upper tail. Outside the
//! tabulated range the p-value is clamped to 0 or 1.
//!
//! `N` is the number of series in the cointegrating regression: 1 for a
//! plain unit-root test, 2 for an Engle-Granger test on a pair.
//!
//! # References
//! - MacKinnon, J.G. (1994). "Approximate asymptotic distribution functions
//!   for unit-root and cointegration tests." JBES 12, 167-176.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

/// Deterministic terms included in the test regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deterministic {
    /// No constant, no trend
    None,
    /// Constant only
    #[default]
    Constant,
}

impl Deterministic {
    /// Number of deterministic regressors added to the design
    pub fn num_regressors(self) -> usize {
        match self {
            Deterministic::None => 0,
            Deterministic::Constant => 1,
        }
    }
}

/// Largest number of series with tabulated coefficients
pub const MAX_SERIES: usize = 2;

struct Surface {
    tau_max: f64,
    tau_min: f64,
    tau_star: f64,
    small_p: [f64; 3],
    large_p: [f64; 4],
}

// Indexed by N - 1.
const NO_CONSTANT: [Surface; MAX_SERIES] = [
    Surface {
        tau_max: 1.51,
        tau_min: -19.04,
        tau_star: -1.04,
        small_p: [0.6344, 1.2378, 3.2496e-2],
        large_p: [0.4797, 9.3557e-1, -0.6999e-1, 3.3066e-2],
    },
    Surface {
        tau_max: 0.86,
        tau_min: -19.62,
        tau_star: -1.53,
        small_p: [1.9129, 1.3857, 3.5322e-2],
        large_p: [1.5578, 8.558e-1, -2.083e-1, -3.3549e-2],
    },
];

const CONSTANT: [Surface; MAX_SERIES] = [
    Surface {
        tau_max: 2.74,
        tau_min: -18.83,
        tau_star: -1.61,
        small_p: [2.1659, 1.4412, 3.8269e-2],
        large_p: [1.7339, 9.3202e-1, -1.2745e-1, -1.0368e-2],
    },
    Surface {
        tau_max: 0.92,
        tau_min: -18.86,
        tau_star: -2.62,
        small_p: [2.92, 1.5012, 3.9796e-2],
        large_p: [2.1945, 6.4695e-1, -2.9198e-1, -4.2377e-2],
    },
];

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Approximate p-value of a Dickey-Fuller t-statistic.
///
/// `num_series` is clamped into `1..=MAX_SERIES`. A NaN statistic maps to 1.
pub fn pvalue(statistic: f64, deterministic: Deterministic, num_series: usize) -> f64 {
    if statistic.is_nan() {
        return 1.0;
    }

    let idx = num_series.clamp(1, MAX_SERIES) - 1;
    let surface = match deterministic {
        Deterministic::None => &NO_CONSTANT[idx],
        Deterministic::Constant => &CONSTANT[idx],
    };

    if statistic > surface.tau_max {
        return 1.0;
    }
    if statistic < surface.tau_min {
        return 0.0;
    }

    let z = if statistic <= surface.tau_star {
        polyval(&surface.small_p, statistic)
    } else {
        polyval(&surface.large_p, statistic)
    };
    norm_cdf(z).clamp(0.0, 1.0)
}
