//! Circuit breaker guarding the market data endpoints.
//!
//! After `failure_threshold` consecutive failed requests the breaker opens
//! and the client stops calling the venue until `cooldown` has elapsed.
//! The first request after the cooldown is let through as a probe
//! (half-open); its outcome closes or re-opens the breaker.
//!
//! ```ignore
//! let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
//! if breaker.is_open() {
//!     return Err(ExchangeError::CircuitOpen(endpoint));
//! }
//! match client.get(url).send().await {
//!     Ok(_) => breaker.record_success(),
//!     Err(_) => breaker.record_failure(),
//! }
//! ```

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Breaker state, stored as a `u32` so it can live in an atomic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CircuitState {
    /// Requests flow normally
    Closed = 0,
    /// Requests are refused
    Open = 1,
    /// One probe request is allowed through
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u32(v: u32) -> Self {
        match v {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Lock-free consecutive-failure breaker.
///
/// Shared by reference between all concurrent requests of one client.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU32,
    consecutive_failures: AtomicU32,
    /// Nanoseconds since `epoch` of the most recent failure
    last_failure_nanos: AtomicU64,
    epoch: Instant,
    failure_threshold: u32,
    cooldown_nanos: u64,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: AtomicU32::new(CircuitState::Closed as u32),
            consecutive_failures: AtomicU32::new(0),
            last_failure_nanos: AtomicU64::new(0),
            epoch: Instant::now(),
            failure_threshold: failure_threshold.max(1),
            cooldown_nanos: cooldown.as_nanos() as u64,
        }
    }

    #[inline]
    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from_u32(self.state.load(Ordering::Acquire))
    }

    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Close the breaker and clear the failure streak
    pub fn record_success(&self) {
        let previous = self.state.swap(CircuitState::Closed as u32, Ordering::AcqRel);
        self.consecutive_failures.store(0, Ordering::Release);
        if previous != CircuitState::Closed as u32 {
            info!("Market data circuit breaker closed after successful probe");
        }
    }

    /// Count a failure, opening the breaker once the streak reaches the threshold
    pub fn record_failure(&self) {
        let streak = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        self.last_failure_nanos
            .store(self.now_nanos(), Ordering::Release);

        if streak < self.failure_threshold {
            return;
        }
        let current = self.state.load(Ordering::Acquire);
        if current != CircuitState::Open as u32
            && self
                .state
                .compare_exchange(
                    current,
                    CircuitState::Open as u32,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
        {
            warn!(
                failures = streak,
                cooldown_ms = self.cooldown_nanos / 1_000_000,
                "Market data circuit breaker opened"
            );
        }
    }

    /// Whether requests must be refused right now.
    ///
    /// Moves Open to HalfOpen once the cooldown has passed, in which case
    /// the caller's request is the probe.
    #[inline]
    pub fn is_open(&self) -> bool {
        if self.state.load(Ordering::Acquire) != CircuitState::Open as u32 {
            return false;
        }
        let since_failure = self
            .now_nanos()
            .saturating_sub(self.last_failure_nanos.load(Ordering::Acquire));
        if since_failure <= self.cooldown_nanos {
            return true;
        }
        if self
            .state
            .compare_exchange(
                CircuitState::Open as u32,
                CircuitState::HalfOpen as u32,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            // A failed probe must trip the breaker again on its own
            self.consecutive_failures
                .store(self.failure_threshold.saturating_sub(1), Ordering::Release);
        }
        false
    }
}
