//! Ordinary least squares regression.
//!
//! Solves the normal equations `XᵀX β = Xᵀy` through a Cholesky
//! factorisation and exposes the quantities the unit-root and
//! cointegration tests need: coefficient t-values, residuals, R² and the
//! Gaussian log-likelihood based information criteria.
//!
//! # Mathematical Definition
//! ```text
//! β̂      = (XᵀX)⁻¹ Xᵀy
//! σ̂²     = SSR / (n − k)
//! se(β̂ᵢ) = √(σ̂² · [(XᵀX)⁻¹]ᵢᵢ)
//! llf    = −n/2 · (ln 2π + ln(SSR/n) + 1)
//! AIC    = −2·llf + 2k
//! BIC    = −2·llf + ln(n)·k
//! ```

use nalgebra::{linalg::Cholesky, DMatrix, DVector};
use std::f64::consts::PI;
use thiserror::Error;

/// Minimum unexplained share of a regressor before the design is treated as collinear
const COLLINEARITY_TOLERANCE: f64 = 1e-10;

/// Errors raised by the OLS solver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OlsError {
    /// Design matrix and response have different row counts
    #[error("Dimension mismatch: design has {rows} rows, response has {len}")]
    DimensionMismatch { rows: usize, len: usize },

    /// Not enough observations to estimate the parameters
    #[error("Underdetermined regression: {nobs} observations for {params} parameters")]
    Underdetermined { nobs: usize, params: usize },

    /// XᵀX is not positive definite (collinear or constant regressors)
    #[error("Singular design matrix")]
    Singular,
}

/// A fitted OLS regression
#[derive(Debug, Clone)]
pub struct OlsFit {
    params: DVector<f64>,
    std_errors: DVector<f64>,
    residuals: DVector<f64>,
    ssr: f64,
    centered_tss: f64,
}

impl OlsFit {
    /// Estimated coefficients, in design column order
    pub fn params(&self) -> &[f64] {
        self.params.as_slice()
    }

    /// t-value of coefficient `i`
    pub fn t_value(&self, i: usize) -> f64 {
        self.params[i] / self.std_errors[i]
    }

    /// Residuals `y − Xβ̂`
    pub fn residuals(&self) -> &[f64] {
        self.residuals.as_slice()
    }

    /// Number of observations
    pub fn nobs(&self) -> usize {
        self.residuals.len()
    }

    /// Number of estimated parameters
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// Sum of squared residuals
    pub fn ssr(&self) -> f64 {
        self.ssr
    }

    /// Coefficient of determination.
    ///
    /// Centered when the design carries an intercept column, uncentered
    /// otherwise.
    pub fn r_squared(&self) -> f64 {
        if self.centered_tss <= 0.0 {
            return 0.0;
        }
        1.0 - self.ssr / self.centered_tss
    }

    /// Gaussian log-likelihood at the OLS estimate
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs() as f64;
        -0.5 * n * ((2.0 * PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }

    /// Bayesian (Schwarz) information criterion
    pub fn bic(&self) -> f64 {
        let n = self.nobs() as f64;
        -2.0 * self.log_likelihood() + n.ln() * self.num_params() as f64
    }
}

/// Fit `y = Xβ + ε` by ordinary least squares.
///
/// `has_intercept` only affects how R² is centered; the intercept column
/// itself must already be part of `x`.
pub fn ols(y: &DVector<f64>, x: &DMatrix<f64>, has_intercept: bool) -> Result<OlsFit, OlsError> {
    let (nobs, params) = x.shape();
    if nobs != y.len() {
        return Err(OlsError::DimensionMismatch {
            rows: nobs,
            len: y.len(),
        });
    }
    if nobs <= params {
        return Err(OlsError::Underdetermined { nobs, params });
    }

    let xt = x.transpose();
    let xtx = &xt * x;
    let xty = &xt * y;

    let gram_diag = xtx.diagonal();
    let chol = Cholesky::new(xtx).ok_or(OlsError::Singular)?;

    // L[i,i]² / (XᵀX)[i,i] is the share of column i not explained by the
    // columns before it.
    let l = chol.l();
    for i in 0..params {
        if gram_diag[i] <= 0.0 || l[(i, i)].powi(2) / gram_diag[i] < COLLINEARITY_TOLERANCE {
            return Err(OlsError::Singular);
        }
    }

    let beta = chol.solve(&xty);

    let residuals = y - x * &beta;
    let ssr = residuals.dot(&residuals);
    let sigma2 = ssr / (nobs - params) as f64;

    let xtx_inv = chol.inverse();
    let mut std_errors = DVector::zeros(params);
    for i in 0..params {
        let se = (sigma2 * xtx_inv[(i, i)]).sqrt();
        if !se.is_finite() {
            return Err(OlsError::Singular);
        }
        std_errors[i] = se;
    }
    if !beta.iter().all(|b| b.is_finite()) {
        return Err(OlsError::Singular);
    }

    let centered_tss = if has_intercept {
        let mean = y.mean();
        y.iter().map(|v| (v - mean).powi(2)).sum()
    } else {
        y.dot(y)
    };

    Ok(OlsFit {
        params: beta,
        std_errors,
        residuals,
        ssr,
        centered_tss,
    })
}

/// Regress `y` on `x` with an intercept: `y = α + βx + e`.
///
/// Parameters are returned as `[α, β]`.
pub fn simple_regression(y: &[f64], x: &[f64]) -> Result<OlsFit, OlsError> {
    if y.len() != x.len() {
        return Err(OlsError::DimensionMismatch {
            rows: x.len(),
            len: y.len(),
        });
    }
    let n = y.len();
    let design = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { x[r] });
    let response = DVector::from_column_slice(y);
    ols(&response, &design, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_line() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 0.5 * v).collect();

        let fit = simple_regression(&y, &x).unwrap();
        assert!((fit.params()[0] - 3.0).abs() < 1e-9);
        assert!((fit.params()[1] - 0.5).abs() < 1e-9);
        assert!(fit.ssr() < 1e-12);
        assert!((fit.r_squared() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_noisy_fit_has_finite_t_values() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| 1.0 + 2.0 * v + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();

        let fit = simple_regression(&y, &x).unwrap();
        assert!((fit.params()[1] - 2.0).abs() < 0.01);
        assert!(fit.t_value(1).is_finite());
        assert!(fit.t_value(1) > 100.0);
        assert_eq!(fit.nobs(), 50);
        assert_eq!(fit.residuals().len(), 50);
    }

    #[test]
    fn test_duplicate_regressor_is_singular() {
        let n = 10;
        let design = DMatrix::from_fn(n, 2, |r, _| r as f64);
        let y = DVector::from_fn(n, |r, _| r as f64 * 2.0);
        assert_eq!(ols(&y, &design, false).unwrap_err(), OlsError::Singular);
    }

    #[test]
    fn test_constant_regressor_with_intercept_is_singular() {
        let x = vec![4.0; 12];
        let y: Vec<f64> = (0..12).map(|i| i as f64).collect();
        assert!(simple_regression(&y, &x).is_err());
    }

    #[test]
    fn test_underdetermined() {
        let design = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 1.0]);
        let y = DVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(
            ols(&y, &design, true).unwrap_err(),
            OlsError::Underdetermined { nobs: 2, params: 2 }
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = simple_regression(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, OlsError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_bic_penalises_extra_parameters_more_than_aic() {
        let x: Vec<f64> = (0..100).map(|i| (i as f64 * 0.37).sin()).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.0 + v + 0.1 * (v * 7.0).cos()).collect();
        let fit = simple_regression(&y, &x).unwrap();
        assert!(fit.bic() - fit.aic() > 0.0);
    }
}
