//! pairscan: screens a futures market universe for cointegrated pairs.
//!
//! - [`math`]: OLS, MacKinnon p-values and the ADF unit-root test
//! - [`discovery`]: series alignment, Engle-Granger screening, ranking,
//!   lookup and reporting
//! - [`exchange`]: market data sources (Binance futures, synthetic)
//! - [`resilience`]: circuit breaker and retry policy for the data client

pub mod cli;
pub mod commands;
pub mod discovery;
pub mod exchange;
pub mod math;
pub mod observability;
pub mod resilience;
