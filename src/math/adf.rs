//! Augmented Dickey-Fuller unit-root test with automatic lag selection.
//!
//! # Test Regression
//! ```text
//! Δx[t] = (α) + γ·x[t−1] + Σᵢ₌₁..ₚ δᵢ·Δx[t−i] + ε[t]
//! ```
//! Under H0 (unit root) γ = 0 and the series is a random walk. The test
//! statistic is the t-value of γ; more negative means stronger evidence the
//! series is stationary (mean-reverting).
//!
//! # Lag Selection
//! Every candidate order `p = 0..=p_max` is fitted on the same trimmed
//! sample so that the information criteria are comparable. The winning
//! order is then refitted on its own, longer sample.

use super::mackinnon::{self, Deterministic};
use super::ols::{ols, OlsError, OlsFit};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Extra observations required beyond the parameter count
pub const SAFETY_MARGIN: usize = 10;

/// Information criterion used to pick the lag order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LagCriterion {
    /// Akaike information criterion
    Aic,
    /// Bayesian (Schwarz) information criterion
    #[default]
    Bic,
    /// No search: always use the maximum lag
    Fixed,
}

impl std::str::FromStr for LagCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aic" => Ok(Self::Aic),
            "bic" | "sic" => Ok(Self::Bic),
            "fixed" | "none" => Ok(Self::Fixed),
            _ => Err(format!(
                "Unknown lag criterion: '{}'. Use 'aic', 'bic' or 'fixed'",
                s
            )),
        }
    }
}

impl std::fmt::Display for LagCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LagCriterion::Aic => write!(f, "aic"),
            LagCriterion::Bic => write!(f, "bic"),
            LagCriterion::Fixed => write!(f, "fixed"),
        }
    }
}

/// Errors from the unit-root test
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitRootError {
    /// Too few observations for the chosen lag order
    #[error("Insufficient data: need at least {needed} usable observations, got {actual}")]
    InsufficientData { needed: usize, actual: usize },

    /// Series (or its lagged level) does not vary
    #[error("Degenerate series: regressor has no variance")]
    DegenerateSeries,
}

impl From<OlsError> for UnitRootError {
    fn from(err: OlsError) -> Self {
        match err {
            OlsError::Underdetermined { nobs, params } => UnitRootError::InsufficientData {
                needed: params + SAFETY_MARGIN,
                actual: nobs,
            },
            OlsError::Singular | OlsError::DimensionMismatch { .. } => {
                UnitRootError::DegenerateSeries
            }
        }
    }
}

/// Settings for a single unit-root test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRootSettings {
    /// Deterministic terms in the test regression
    pub deterministic: Deterministic,
    /// Lag selection criterion
    pub criterion: LagCriterion,
    /// Override for the Schwarz-rule maximum lag
    pub max_lag: Option<usize>,
    /// Series count used for the p-value surface (1 for a plain ADF)
    pub num_series: usize,
    /// Deterministic term of the p-value surface when it differs from the
    /// test regression's, as for Engle-Granger residuals
    pub pvalue_deterministic: Option<Deterministic>,
}

impl Default for UnitRootSettings {
    fn default() -> Self {
        Self {
            deterministic: Deterministic::Constant,
            criterion: LagCriterion::Bic,
            max_lag: None,
            num_series: 1,
            pvalue_deterministic: None,
        }
    }
}

/// Outcome of an ADF test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    /// t-statistic on the lagged level
    pub statistic: f64,
    /// MacKinnon approximate p-value
    pub pvalue: f64,
    /// Lag order actually used
    pub used_lag: usize,
    /// Largest lag order considered
    pub max_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
}

/// Schwarz rule of thumb: `floor(12 · (n/100)^¼)`
pub fn schwert_max_lag(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

/// Run the augmented Dickey-Fuller test on `x`.
pub fn test_unit_root(x: &[f64], settings: &UnitRootSettings) -> Result<AdfResult, UnitRootError> {
    let n = x.len();
    let k_det = settings.deterministic.num_regressors();

    if n < 3 {
        return Err(UnitRootError::InsufficientData {
            needed: 2 + k_det + SAFETY_MARGIN,
            actual: n.saturating_sub(1),
        });
    }
    if is_constant(x) {
        return Err(UnitRootError::DegenerateSeries);
    }

    let cap = (n / 2) as isize - k_det as isize - 1;
    if cap < 0 {
        return Err(UnitRootError::InsufficientData {
            needed: 2 * (k_det + 1),
            actual: n,
        });
    }
    let requested = settings.max_lag.unwrap_or_else(|| schwert_max_lag(n));
    let max_lag = requested.min(cap as usize);

    let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    let search_nobs = n - 1 - max_lag;
    let search_params = 1 + max_lag + k_det;
    if search_nobs < search_params + SAFETY_MARGIN {
        return Err(UnitRootError::InsufficientData {
            needed: search_params + SAFETY_MARGIN,
            actual: search_nobs,
        });
    }

    let used_lag = match settings.criterion {
        LagCriterion::Fixed => max_lag,
        LagCriterion::Aic | LagCriterion::Bic => {
            select_lag(x, &dx, max_lag, settings.deterministic, settings.criterion)?
        }
    };

    let fit = fit_adf_regression(x, &dx, used_lag, used_lag, settings.deterministic)?;
    let statistic = fit.t_value(0);
    if !statistic.is_finite() {
        return Err(UnitRootError::DegenerateSeries);
    }

    let surface = settings
        .pvalue_deterministic
        .unwrap_or(settings.deterministic);
    let pvalue = mackinnon::pvalue(statistic, surface, settings.num_series);

    Ok(AdfResult {
        statistic,
        pvalue,
        used_lag,
        max_lag,
        nobs: fit.nobs(),
    })
}

/// Pick the lag order minimising the criterion over a common sample.
fn select_lag(
    x: &[f64],
    dx: &[f64],
    max_lag: usize,
    deterministic: Deterministic,
    criterion: LagCriterion,
) -> Result<usize, UnitRootError> {
    let mut best: Option<(usize, f64)> = None;

    for lag in 0..=max_lag {
        let fit = match fit_adf_regression(x, dx, lag, max_lag, deterministic) {
            Ok(fit) => fit,
            Err(e) => {
                trace!(lag, error = %e, "Skipping lag candidate");
                continue;
            }
        };
        let ic = match criterion {
            LagCriterion::Aic => fit.aic(),
            _ => fit.bic(),
        };
        if ic.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, best_ic)| ic < best_ic) {
            best = Some((lag, ic));
        }
    }

    best.map(|(lag, _)| lag)
        .ok_or(UnitRootError::DegenerateSeries)
}

/// Fit the ADF regression with `lags` lagged differences, dropping the
/// first `trim` differences so candidates share a sample.
fn fit_adf_regression(
    x: &[f64],
    dx: &[f64],
    lags: usize,
    trim: usize,
    deterministic: Deterministic,
) -> Result<OlsFit, UnitRootError> {
    let nobs = dx.len() - trim;
    let k_det = deterministic.num_regressors();
    let cols = 1 + lags + k_det;

    // Rows are indexed by j in trim..dx.len(); dx[j] = x[j+1] - x[j]
    let design = DMatrix::from_fn(nobs, cols, |r, c| {
        let j = trim + r;
        if c == 0 {
            x[j]
        } else if c <= lags {
            dx[j - c]
        } else {
            1.0
        }
    });
    let response = DVector::from_column_slice(&dx[trim..]);

    Ok(ols(&response, &design, k_det > 0)?)
}

/// Whether a series has (numerically) no variation
pub fn is_constant(x: &[f64]) -> bool {
    if x.is_empty() {
        return true;
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    std_dev == 0.0 || std_dev <= 1e-12 * mean.abs().max(std_dev)
}
