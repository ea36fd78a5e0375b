//! Statistical primitives for cointegration screening.
//!
//! - [`ols`]: least-squares regression with standard errors and
//!   information criteria
//! - [`mackinnon`]: approximate p-values for Dickey-Fuller statistics
//! - [`adf`]: augmented Dickey-Fuller unit-root test with automatic lag
//!   selection

pub mod adf;
pub mod mackinnon;
pub mod ols;

pub use adf::{test_unit_root, AdfResult, LagCriterion, UnitRootError, UnitRootSettings};
pub use mackinnon::Deterministic;
pub use ols::{ols, simple_regression, OlsError, OlsFit};
