//! Token Bucket rate limiter.
//!
//! The bucket starts full with `max_tokens` tokens. Each admitted call
//! consumes one token and tokens flow back at `refill_rate` per second.
//! Refill is computed when the limiter is consulted:
//!
//! ```text
//! tokens = min(max_tokens, tokens + elapsed_seconds * refill_rate)
//! ```
//!
//! When fewer than one token is available the call is rejected at once;
//! the limiter never waits or queues.
//!
//! ## Example
//!
//! ```rust
//! use armature_resilience::{RateLimiter, RateLimiterConfig};
//!
//! let limiter = RateLimiter::new(RateLimiterConfig::new("search", 5.0, 5.0));
//!
//! for _ in 0..5 {
//!     assert!(limiter.acquire().is_ok());
//! }
//! assert!(limiter.acquire().is_err());
//! ```

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::clock::{Clock, MonotonicClock};
use crate::error::{ResilienceError, Result};

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Name for logging/stats.
    pub name: String,
    /// Bucket capacity (burst size).
    pub max_tokens: f64,
    /// Tokens added per second.
    pub refill_rate: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_tokens: 10.0,
            refill_rate: 10.0,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new configuration.
    pub fn new(name: impl Into<String>, max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            name: name.into(),
            max_tokens,
            refill_rate,
        }
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_tokens.is_finite() && self.max_tokens > 0.0) {
            return Err(ResilienceError::config(format!(
                "rate limiter '{}': max_tokens must be greater than 0",
                self.name
            )));
        }
        if !(self.refill_rate.is_finite() && self.refill_rate > 0.0) {
            return Err(ResilienceError::config(format!(
                "rate limiter '{}': refill_rate must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Bucket state, guarded by the limiter's mutex.
#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, config: &RateLimiterConfig) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = refilled(self.tokens, elapsed, config);
        self.last_refill = now;
    }
}

fn refilled(tokens: f64, elapsed: Duration, config: &RateLimiterConfig) -> f64 {
    (tokens + elapsed.as_secs_f64() * config.refill_rate).min(config.max_tokens)
}

/// Token bucket rate limiter.
///
/// Share one instance (`Arc<RateLimiter>`) across call sites to enforce a
/// single global cap.
pub struct RateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    bucket: Mutex<Bucket>,
    /// Reference point for the published refill time.
    origin: Instant,
    /// Token count after the last admission check (f64 bits).
    published_tokens: AtomicU64,
    /// Nanoseconds from `origin` to the last refill.
    published_at: AtomicU64,
    total_admitted: AtomicU64,
    total_rejected: AtomicU64,
}

impl RateLimiter {
    /// Create a new rate limiter on the runtime clock.
    ///
    /// # Panics
    ///
    /// Panics if `max_tokens` or `refill_rate` is not positive.
    pub fn new(config: RateLimiterConfig) -> Arc<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    /// Create a new rate limiter reading time from `clock`.
    ///
    /// # Panics
    ///
    /// Panics if `max_tokens` or `refill_rate` is not positive.
    pub fn with_clock(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        assert!(
            config.max_tokens.is_finite() && config.max_tokens > 0.0,
            "Max tokens must be greater than 0"
        );
        assert!(
            config.refill_rate.is_finite() && config.refill_rate > 0.0,
            "Refill rate must be greater than 0"
        );

        info!(
            name = %config.name,
            max_tokens = config.max_tokens,
            refill_rate = config.refill_rate,
            "Rate limiter initialized"
        );

        let now = clock.now();
        Arc::new(Self {
            bucket: Mutex::new(Bucket {
                tokens: config.max_tokens,
                last_refill: now,
            }),
            origin: now,
            published_tokens: AtomicU64::new(config.max_tokens.to_bits()),
            published_at: AtomicU64::new(0),
            total_admitted: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
            config,
            clock,
        })
    }

    /// Create a rate limiter, returning a configuration error instead of
    /// panicking.
    pub fn try_new(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Self::with_clock(config, clock))
    }

    /// Get the limiter name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the capacity.
    pub fn max_tokens(&self) -> f64 {
        self.config.max_tokens
    }

    /// Get the refill rate (tokens per second).
    pub fn refill_rate(&self) -> f64 {
        self.config.refill_rate
    }

    /// Take one token or fail with `RateLimitExceeded`.
    ///
    /// Refill, check and decrement happen under one lock, so two callers can
    /// never both take the last token.
    pub fn acquire(&self) -> Result<()> {
        let now = self.clock.now();
        let mut bucket = self.bucket.lock();
        bucket.refill(now, &self.config);

        let outcome = if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - bucket.tokens;
            // Saturates for rates too slow to express as a Duration.
            Err(Duration::try_from_secs_f64(missing / self.config.refill_rate)
                .unwrap_or(Duration::MAX))
        };

        self.publish(&bucket);
        drop(bucket);

        match outcome {
            Ok(()) => {
                self.total_admitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(retry_after) => {
                self.total_rejected.fetch_add(1, Ordering::Relaxed);
                debug!(
                    name = %self.config.name,
                    retry_after = ?retry_after,
                    "Rate limit exceeded"
                );
                Err(ResilienceError::rate_limited(&self.config.name, retry_after))
            }
        }
    }

    /// Take one token, returning whether the call is admitted.
    pub fn try_acquire(&self) -> bool {
        self.acquire().is_ok()
    }

    /// Approximate number of tokens available now.
    ///
    /// Reads the state published by the last admission check plus the
    /// refill since then, without taking the lock. Concurrent admissions may
    /// make the value momentarily stale.
    pub fn available_tokens(&self) -> f64 {
        let tokens = f64::from_bits(self.published_tokens.load(Ordering::Acquire));
        let at = self.origin + Duration::from_nanos(self.published_at.load(Ordering::Acquire));
        let elapsed = self.clock.now().saturating_duration_since(at);
        refilled(tokens, elapsed, &self.config)
    }

    /// Execute `f` if a token is available.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<ResilienceError>,
    {
        self.acquire()?;
        f().await
    }

    /// Refill the bucket to capacity.
    pub fn reset(&self) {
        let now = self.clock.now();
        let mut bucket = self.bucket.lock();
        bucket.tokens = self.config.max_tokens;
        bucket.last_refill = now;
        self.publish(&bucket);
    }

    fn publish(&self, bucket: &Bucket) {
        let at = bucket.last_refill.saturating_duration_since(self.origin);
        let nanos = u64::try_from(at.as_nanos()).unwrap_or(u64::MAX);
        self.published_at.store(nanos, Ordering::Release);
        self.published_tokens
            .store(bucket.tokens.to_bits(), Ordering::Release);
    }

    /// Get rate limiter statistics.
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            name: self.config.name.clone(),
            max_tokens: self.config.max_tokens,
            available_tokens: self.available_tokens(),
            total_admitted: self.total_admitted.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.config.name)
            .field("max_tokens", &self.config.max_tokens)
            .field("refill_rate", &self.config.refill_rate)
            .field("available_tokens", &self.available_tokens())
            .finish()
    }
}

/// Rate limiter statistics.
#[derive(Debug, Clone)]
pub struct RateLimiterStats {
    /// Limiter name.
    pub name: String,
    /// Capacity.
    pub max_tokens: f64,
    /// Approximate tokens available.
    pub available_tokens: f64,
    /// Admitted calls.
    pub total_admitted: u64,
    /// Rejected calls.
    pub total_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(max_tokens: f64, refill_rate: f64) -> (Arc<RateLimiter>, ManualClock) {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(
            RateLimiterConfig::new("test", max_tokens, refill_rate),
            Arc::new(clock.clone()),
        );
        (limiter, clock)
    }

    #[test]
    fn test_initial_capacity() {
        let (limiter, _clock) = limiter(10.0, 1.0);
        assert_eq!(limiter.available_tokens(), 10.0);
    }

    #[test]
    fn test_burst_then_reject_then_refill() {
        let (limiter, clock) = limiter(5.0, 5.0);

        for _ in 0..5 {
            assert!(limiter.acquire().is_ok());
        }

        let error = limiter.acquire().unwrap_err();
        assert!(matches!(error, ResilienceError::RateLimitExceeded { .. }));
        assert_eq!(error.retry_after(), Some(Duration::from_millis(200)));

        clock.advance(Duration::from_secs(1));
        assert!(limiter.acquire().is_ok());
    }

    #[test]
    fn test_retry_after_saturates_for_tiny_refill_rate() {
        let (limiter, _clock) = limiter(1.0, 1e-20);

        assert!(limiter.acquire().is_ok());
        let error = limiter.acquire().unwrap_err();

        assert_eq!(error.retry_after(), Some(Duration::MAX));
        assert_eq!(limiter.stats().total_rejected, 1);
    }

    #[test]
    fn test_refill_is_capped() {
        let (limiter, clock) = limiter(3.0, 10.0);

        assert!(limiter.acquire().is_ok());
        clock.advance(Duration::from_secs(60));

        assert_eq!(limiter.available_tokens(), 3.0);
        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_partial_refill() {
        let (limiter, clock) = limiter(2.0, 4.0);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());

        clock.advance(Duration::from_millis(100));
        assert!(!limiter.try_acquire());
        assert!((limiter.available_tokens() - 0.4).abs() < 1e-9);

        clock.advance(Duration::from_millis(200));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_reset() {
        let (limiter, _clock) = limiter(5.0, 0.1);
        for _ in 0..5 {
            limiter.try_acquire();
        }

        limiter.reset();

        assert_eq!(limiter.available_tokens(), 5.0);
    }

    #[test]
    fn test_concurrent_callers_never_overdraw() {
        let (limiter, _clock) = limiter(50.0, 0.001);

        let admitted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let limiter = &limiter;
                    scope.spawn(move || (0..20).filter(|_| limiter.try_acquire()).count())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(admitted, 50);
        assert_eq!(limiter.stats().total_rejected, 110);
    }

    #[tokio::test]
    async fn test_call_rejects_without_invoking() {
        let (limiter, _clock) = limiter(1.0, 1.0);
        assert!(limiter.try_acquire());

        let mut invoked = false;
        let result: std::result::Result<(), ResilienceError> = limiter
            .call(|| {
                invoked = true;
                async { Ok(()) }
            })
            .await;

        assert!(result.is_err());
        assert!(!invoked);
    }

    #[test]
    #[should_panic(expected = "Max tokens must be greater than 0")]
    fn test_zero_capacity() {
        RateLimiter::new(RateLimiterConfig::new("bad", 0.0, 1.0));
    }

    #[test]
    fn test_invalid_refill_rate() {
        let config = RateLimiterConfig::new("bad", 10.0, 0.0);
        assert!(matches!(
            RateLimiter::try_new(config, Arc::new(ManualClock::new())),
            Err(ResilienceError::Configuration(_))
        ));
    }
}
