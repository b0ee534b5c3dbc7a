//! Time limiter for asynchronous operations.
//!
//! The operation races a deadline. If the deadline wins, the operation's
//! future is dropped, which cancels it at its next suspension point, and
//! `OperationTimeout` is returned. Operations release what they hold through
//! their own drop guards; the limiter knows nothing about them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use armature_resilience::{TimeLimiter, TimeLimiterConfig};
//! use std::time::Duration;
//!
//! let limiter = TimeLimiter::new(
//!     TimeLimiterConfig::new(Duration::from_secs(2)).name("geocode"),
//! );
//!
//! let location = limiter.run(|| geocoder.lookup(address)).await?;
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use crate::error::{ResilienceError, Result};

/// Time limiter configuration.
///
/// There is no default deadline; every limiter states its own.
#[derive(Debug, Clone)]
pub struct TimeLimiterConfig {
    /// Operation name carried in timeout errors.
    pub name: String,
    /// Deadline for each call.
    pub timeout: Duration,
}

impl TimeLimiterConfig {
    /// Create a new time limiter configuration.
    pub fn new(timeout: Duration) -> Self {
        Self {
            name: "operation".to_string(),
            timeout,
        }
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ResilienceError::config(format!(
                "time limiter '{}': timeout must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Time limiter executor.
#[derive(Debug, Clone)]
pub struct TimeLimiter {
    config: TimeLimiterConfig,
}

impl TimeLimiter {
    /// Create a new time limiter.
    pub fn new(config: TimeLimiterConfig) -> Self {
        Self { config }
    }

    /// Create with a duration.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(TimeLimiterConfig::new(timeout))
    }

    /// Get the operation name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the configured deadline.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Execute with the configured deadline.
    pub async fn run<F, Fut, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<ResilienceError>,
    {
        self.run_with(self.config.timeout, f).await
    }

    /// Execute with a per-call deadline.
    ///
    /// A result or error produced in time is returned unchanged.
    pub async fn run_with<F, Fut, T, E>(&self, timeout: Duration, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<ResilienceError>,
    {
        let started = Instant::now();

        match tokio::time::timeout(timeout, f()).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed = started.elapsed();
                warn!(
                    name = %self.config.name,
                    timeout = ?timeout,
                    elapsed = ?elapsed,
                    "Operation timed out"
                );
                Err(E::from(ResilienceError::operation_timeout(
                    &self.config.name,
                    timeout,
                    elapsed,
                )))
            }
        }
    }
}

/// Execute a fallible future with a deadline.
pub async fn with_timeout<F, Fut, T, E>(
    name: &str,
    timeout: Duration,
    f: F,
) -> std::result::Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: From<ResilienceError>,
{
    TimeLimiter::new(TimeLimiterConfig::new(timeout).name(name))
        .run(f)
        .await
}
