//! Resilience patterns for the market data client.
//!
//! - [`CircuitBreaker`]: stops hammering a venue that keeps failing
//! - [`RetryPolicy`]: exponential backoff for transient errors

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use retry::RetryPolicy;
