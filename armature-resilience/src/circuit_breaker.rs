//! Circuit Breaker pattern implementation.
//!
//! The circuit breaker counts consecutive failures of a dependency and
//! "opens" once a threshold is reached, rejecting calls without attempting
//! them until a recovery timeout has passed.
//!
//! ## States
//!
//! - **Closed**: Normal operation, calls pass through
//! - **Open**: Circuit is tripped, calls are rejected immediately
//! - **Half-Open**: Recovery timeout elapsed, a single probe call is let through
//!
//! Half-open is never stored. It is derived from the time of the last
//! failure whenever the breaker is consulted, so no timer is needed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use armature_resilience::{CircuitBreaker, CircuitBreakerConfig, ResilienceError};
//! use std::time::Duration;
//!
//! let circuit = CircuitBreaker::new(
//!     CircuitBreakerConfig::new("inventory")
//!         .failure_threshold(5)
//!         .recovery_timeout(Duration::from_secs(30)),
//! );
//!
//! match circuit.call(|| inventory_client.fetch(sku)).await {
//!     Ok(stock) => Ok(stock),
//!     Err(ApiError::Guard(ResilienceError::CircuitOpen { .. })) => Ok(Stock::unknown()),
//!     Err(e) => Err(e),
//! }
//! ```

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::classify::GuardError;
use crate::clock::{Clock, MonotonicClock};
use crate::error::{ResilienceError, Result};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, calls pass through normally.
    Closed,
    /// Circuit is open, calls are rejected.
    Open,
    /// Recovery timeout elapsed, the next call is a probe.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Name of the circuit breaker (for logging/stats).
    pub name: String,
    /// Number of consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// Time to wait after the last failure before probing again.
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new configuration with a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the failure threshold.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the recovery timeout.
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(ResilienceError::config(format!(
                "circuit breaker '{}': failure_threshold must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Mutable breaker state. Transitions are functions of the stored fields
/// and the instant passed in.
#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    last_failure_time: Option<Instant>,
    open: bool,
    probe_in_flight: bool,
}

impl BreakerState {
    fn effective(&self, now: Instant, recovery_timeout: Duration) -> CircuitState {
        if !self.open {
            return CircuitState::Closed;
        }
        match self.last_failure_time {
            Some(at) if now.saturating_duration_since(at) >= recovery_timeout => {
                CircuitState::HalfOpen
            }
            _ => CircuitState::Open,
        }
    }

    fn close(&mut self) {
        self.consecutive_failures = 0;
        self.last_failure_time = None;
        self.open = false;
        self.probe_in_flight = false;
    }

    fn trip(&mut self, now: Instant) {
        self.open = true;
        self.last_failure_time = Some(now);
        self.probe_in_flight = false;
    }
}

/// How a call was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Probe,
}

/// Circuit breaker for protecting against cascade failures.
///
/// Only consecutive failures are counted. Admission rejections coming out
/// of the wrapped call (an inner breaker, rate limiter or bulkhead) are
/// neither failures nor successes.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerState>,
    total_requests: AtomicU64,
    total_failures: AtomicU64,
    total_successes: AtomicU64,
    total_rejections: AtomicU64,
}

impl CircuitBreaker {
    /// Create a new circuit breaker on the runtime clock.
    ///
    /// # Panics
    ///
    /// Panics if `failure_threshold` is 0.
    pub fn new(config: CircuitBreakerConfig) -> Arc<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    /// Create a new circuit breaker reading time from `clock`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_threshold` is 0.
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        assert!(
            config.failure_threshold > 0,
            "Failure threshold must be greater than 0"
        );

        info!(
            name = %config.name,
            failure_threshold = config.failure_threshold,
            recovery_timeout = ?config.recovery_timeout,
            "Circuit breaker initialized"
        );

        Arc::new(Self {
            config,
            clock,
            inner: Mutex::new(BreakerState::default()),
            total_requests: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            total_successes: AtomicU64::new(0),
            total_rejections: AtomicU64::new(0),
        })
    }

    /// Create a circuit breaker, returning a configuration error instead of
    /// panicking.
    pub fn try_new(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Self::with_clock(config, clock))
    }

    /// Create with default configuration.
    pub fn default_circuit() -> Arc<Self> {
        Self::new(CircuitBreakerConfig::default())
    }

    /// Get the circuit breaker name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the current effective state.
    pub fn state(&self) -> CircuitState {
        let now = self.clock.now();
        self.inner.lock().effective(now, self.config.recovery_timeout)
    }

    /// Check whether a call would be admitted right now, without claiming
    /// the half-open probe.
    pub fn is_call_permitted(&self) -> bool {
        let now = self.clock.now();
        let inner = self.inner.lock();
        match inner.effective(now, self.config.recovery_timeout) {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => !inner.probe_in_flight,
        }
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// Returns `CircuitOpen` without invoking `f` while the circuit is open.
    /// Otherwise returns the operation's result unchanged. If the returned
    /// future is dropped after the operation started, the call counts as a
    /// failure.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: GuardError,
    {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let Some(admission) = self.admit() else {
            self.total_rejections.fetch_add(1, Ordering::Relaxed);
            debug!(name = %self.config.name, "Circuit breaker rejected call");
            return Err(E::from(ResilienceError::circuit_open(&self.config.name)));
        };

        let outcome = CallOutcome {
            breaker: self,
            admission,
            pending: true,
        };

        let result = f().await;

        match &result {
            Ok(_) => outcome.success(),
            Err(e) if e.kind().is_rejection() => outcome.neutral(),
            Err(e) => {
                debug!(name = %self.config.name, error = %e, "Call through circuit breaker failed");
                outcome.failure();
            }
        }

        result
    }

    /// Decide admission, claiming the probe slot when half-open.
    fn admit(&self) -> Option<Admission> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        match inner.effective(now, self.config.recovery_timeout) {
            CircuitState::Closed => Some(Admission::Normal),
            CircuitState::Open => None,
            CircuitState::HalfOpen if inner.probe_in_flight => None,
            CircuitState::HalfOpen => {
                inner.probe_in_flight = true;
                debug!(name = %self.config.name, "Circuit breaker HALF-OPEN, admitting probe");
                Some(Admission::Probe)
            }
        }
    }

    /// Record a successful operation outside of [`call`](Self::call).
    pub fn record_success(&self) {
        let admission = self.manual_admission();
        self.on_success(admission);
    }

    /// Record a failed operation outside of [`call`](Self::call).
    pub fn record_failure(&self) {
        let admission = self.manual_admission();
        self.on_failure(admission);
    }

    fn manual_admission(&self) -> Admission {
        match self.state() {
            CircuitState::HalfOpen => Admission::Probe,
            _ => Admission::Normal,
        }
    }

    fn on_success(&self, admission: Admission) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock();

        if !inner.open {
            inner.consecutive_failures = 0;
            return;
        }

        match admission {
            Admission::Probe => {
                inner.close();
                info!(name = %self.config.name, "Circuit breaker CLOSED");
            }
            // Admitted before the circuit opened.
            Admission::Normal => {
                debug!(name = %self.config.name, "Success recorded while circuit open");
            }
        }
    }

    fn on_failure(&self, admission: Admission) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if !inner.open {
            inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
            if inner.consecutive_failures >= self.config.failure_threshold {
                inner.trip(now);
                warn!(
                    name = %self.config.name,
                    failures = inner.consecutive_failures,
                    "Circuit breaker OPENED"
                );
            }
            return;
        }

        if admission == Admission::Probe {
            inner.trip(now);
            warn!(name = %self.config.name, "Circuit breaker probe failed, re-OPENED");
        }
    }

    fn on_neutral(&self, admission: Admission) {
        if admission == Admission::Probe {
            self.inner.lock().probe_in_flight = false;
        }
    }

    /// Manually reset the circuit breaker to closed state.
    pub fn reset(&self) {
        self.inner.lock().close();
        info!(name = %self.config.name, "Circuit breaker reset");
    }

    /// Manually force the circuit open. The recovery timeout starts now.
    pub fn force_open(&self) {
        let now = self.clock.now();
        self.inner.lock().trip(now);
        warn!(name = %self.config.name, "Circuit breaker forced OPEN");
    }

    // Metrics

    /// Get the current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Time of the failure that opened (or re-opened) the circuit.
    pub fn last_failure_time(&self) -> Option<Instant> {
        self.inner.lock().last_failure_time
    }

    /// Get total calls seen.
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Get total successful calls.
    pub fn total_successes(&self) -> u64 {
        self.total_successes.load(Ordering::Relaxed)
    }

    /// Get total failed calls.
    pub fn total_failures(&self) -> u64 {
        self.total_failures.load(Ordering::Relaxed)
    }

    /// Get total rejected calls (circuit open).
    pub fn total_rejections(&self) -> u64 {
        self.total_rejections.load(Ordering::Relaxed)
    }

    /// Get circuit breaker statistics.
    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            name: self.config.name.clone(),
            state: self.state(),
            total_requests: self.total_requests(),
            total_successes: self.total_successes(),
            total_failures: self.total_failures(),
            total_rejections: self.total_rejections(),
            consecutive_failures: self.consecutive_failures(),
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("consecutive_failures", &self.consecutive_failures())
            .finish()
    }
}

/// Records the outcome of one admitted call exactly once. Dropped while
/// still pending means the call was cancelled, which counts as a failure.
struct CallOutcome<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    pending: bool,
}

impl CallOutcome<'_> {
    fn success(mut self) {
        self.pending = false;
        self.breaker.on_success(self.admission);
    }

    fn failure(mut self) {
        self.pending = false;
        self.breaker.on_failure(self.admission);
    }

    fn neutral(mut self) {
        self.pending = false;
        self.breaker.on_neutral(self.admission);
    }
}

impl Drop for CallOutcome<'_> {
    fn drop(&mut self) {
        if self.pending {
            debug!(name = %self.breaker.config.name, "Call cancelled, counting as failure");
            self.breaker.on_failure(self.admission);
        }
    }
}

/// Circuit breaker statistics.
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    /// Circuit breaker name.
    pub name: String,
    /// Current state.
    pub state: CircuitState,
    /// Total calls.
    pub total_requests: u64,
    /// Total successes.
    pub total_successes: u64,
    /// Total failures.
    pub total_failures: u64,
    /// Total rejections.
    pub total_rejections: u64,
    /// Current consecutive failure count.
    pub consecutive_failures: u32,
}

impl CircuitBreakerStats {
    /// Calculate success rate (0.0 - 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            1.0
        } else {
            self.total_successes as f64 / self.total_requests as f64
        }
    }

    /// Calculate failure rate (0.0 - 1.0).
    pub fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_failures as f64 / self.total_requests as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::AtomicU32;

    fn breaker(threshold: u32, recovery: Duration) -> (Arc<CircuitBreaker>, ManualClock) {
        let clock = ManualClock::new();
        let cb = CircuitBreaker::with_clock(
            CircuitBreakerConfig::new("test")
                .failure_threshold(threshold)
                .recovery_timeout(recovery),
            Arc::new(clock.clone()),
        );
        (cb, clock)
    }

    async fn fail(cb: &CircuitBreaker) -> std::result::Result<(), ResilienceError> {
        cb.call(|| async { Err(ResilienceError::config("boom")) }).await
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_at_threshold() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));

        for n in 1..3 {
            let _ = fail(&cb).await;
            assert_eq!(cb.state(), CircuitState::Closed);
            assert_eq!(cb.consecutive_failures(), n);
        }

        let _ = fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.last_failure_time().is_some());
    }

    #[tokio::test]
    async fn test_circuit_breaker_rejects_without_invoking() {
        let (cb, clock) = breaker(1, Duration::from_secs(30));
        let _ = fail(&cb).await;

        let invocations = AtomicU32::new(0);
        for _ in 0..5 {
            clock.advance(Duration::from_secs(5));
            let result: std::result::Result<(), ResilienceError> = cb
                .call(|| async {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await;
            assert!(matches!(result, Err(ResilienceError::CircuitOpen { .. })));
        }

        assert_eq!(invocations.load(Ordering::SeqCst), 0);
        assert_eq!(cb.consecutive_failures(), 1);
        assert_eq!(cb.total_rejections(), 5);
    }

    #[tokio::test]
    async fn test_circuit_breaker_success_resets_count() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));

        let _ = fail(&cb).await;
        let _ = fail(&cb).await;
        assert_eq!(cb.consecutive_failures(), 2);

        let result: std::result::Result<i32, ResilienceError> = cb.call(|| async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_half_open_probe_success_closes() {
        let (cb, clock) = breaker(2, Duration::from_secs(10));
        let _ = fail(&cb).await;
        let _ = fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Open);

        clock.advance(Duration::from_secs(10));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        let result: std::result::Result<(), ResilienceError> = cb.call(|| async { Ok(()) }).await;
        assert!(result.is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
        assert!(cb.last_failure_time().is_none());
    }

    #[tokio::test]
    async fn test_half_open_probe_failure_restarts_recovery() {
        let (cb, clock) = breaker(1, Duration::from_secs(10));
        let _ = fail(&cb).await;
        let first_opened = cb.last_failure_time();

        clock.advance(Duration::from_secs(11));
        let _ = fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.last_failure_time() > first_opened);

        clock.advance(Duration::from_secs(9));
        assert_eq!(cb.state(), CircuitState::Open);

        clock.advance(Duration::from_secs(1));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test]
    async fn test_half_open_admits_single_probe() {
        let (cb, clock) = breaker(1, Duration::from_secs(10));
        let _ = fail(&cb).await;
        clock.advance(Duration::from_secs(10));

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let probe = cb.call(|| async move {
            let _ = release_rx.await;
            Ok::<(), ResilienceError>(())
        });
        let concurrent = async {
            tokio::task::yield_now().await;
            assert!(!cb.is_call_permitted());
            let rejected: std::result::Result<(), ResilienceError> =
                cb.call(|| async { Ok(()) }).await;
            let _ = release_tx.send(());
            rejected
        };

        let (probe, concurrent) = tokio::join!(probe, concurrent);

        assert!(probe.is_ok());
        assert!(matches!(concurrent, Err(ResilienceError::CircuitOpen { .. })));
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.total_rejections(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_probe_reopens() {
        let (cb, clock) = breaker(1, Duration::from_secs(10));
        let _ = fail(&cb).await;
        let first_opened = cb.last_failure_time();
        clock.advance(Duration::from_secs(10));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        let probe = cb.call(|| async {
            std::future::pending::<()>().await;
            Ok::<(), ResilienceError>(())
        });
        let _ = tokio::time::timeout(Duration::from_millis(10), probe).await;

        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.last_failure_time() > first_opened);
        assert!(!cb.is_call_permitted());

        clock.advance(Duration::from_secs(10));
        assert!(cb.is_call_permitted());
    }

    #[tokio::test]
    async fn test_late_success_leaves_circuit_open() {
        let (cb, _clock) = breaker(1, Duration::from_secs(30));

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let slow = cb.call(|| async move {
            let _ = release_rx.await;
            Ok::<(), ResilienceError>(())
        });
        let trip = async {
            tokio::task::yield_now().await;
            let _ = fail(&cb).await;
            assert_eq!(cb.state(), CircuitState::Open);
            let _ = release_tx.send(());
        };

        let (slow, ()) = tokio::join!(slow, trip);

        assert!(slow.is_ok());
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn test_rejected_probe_frees_probe_slot() {
        let (cb, clock) = breaker(1, Duration::from_secs(10));
        let _ = fail(&cb).await;
        clock.advance(Duration::from_secs(10));

        let result: std::result::Result<(), ResilienceError> = cb
            .call(|| async { Err(ResilienceError::bulkhead_full("pool", 4)) })
            .await;

        assert!(matches!(result, Err(ResilienceError::BulkheadFull { .. })));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.is_call_permitted());

        let result: std::result::Result<(), ResilienceError> = cb.call(|| async { Ok(()) }).await;
        assert!(result.is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_nested_circuit_open_is_not_counted() {
        let (outer, _clock) = breaker(1, Duration::from_secs(30));

        for _ in 0..3 {
            let result: std::result::Result<(), ResilienceError> = outer
                .call(|| async { Err(ResilienceError::circuit_open("inner")) })
                .await;
            assert!(matches!(result, Err(ResilienceError::CircuitOpen { ref name }) if name == "inner"));
        }

        assert_eq!(outer.state(), CircuitState::Closed);
        assert_eq!(outer.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_original_error_passes_through() {
        let (cb, _clock) = breaker(5, Duration::from_secs(30));
        let result: std::result::Result<(), ResilienceError> = cb
            .call(|| async { Err(ResilienceError::config("downstream exploded")) })
            .await;

        assert_eq!(
            result.unwrap_err(),
            ResilienceError::config("downstream exploded")
        );
    }

    #[tokio::test]
    async fn test_cancelled_call_counts_as_failure() {
        let (cb, _clock) = breaker(1, Duration::from_secs(30));

        let call = cb.call(|| async {
            std::future::pending::<()>().await;
            Ok::<(), ResilienceError>(())
        });
        let _ = tokio::time::timeout(Duration::from_millis(10), call).await;

        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_repeated_success_is_idempotent() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));

        for _ in 0..10 {
            let _: std::result::Result<(), ResilienceError> = cb.call(|| async { Ok(()) }).await;
        }

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
        assert_eq!(cb.stats().success_rate(), 1.0);
    }

    #[test]
    fn test_reset_and_force_open() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));

        cb.force_open();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.is_call_permitted());

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.is_call_permitted());
    }

    #[test]
    fn test_record_failure_outside_call() {
        let (cb, _clock) = breaker(2, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = CircuitBreakerConfig::new("bad").failure_threshold(0);
        let result = CircuitBreaker::try_new(config, Arc::new(ManualClock::new()));
        assert!(matches!(result, Err(ResilienceError::Configuration(_))));
    }
}
