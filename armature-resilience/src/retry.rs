//! Retry pattern with exponential backoff.
//!
//! Each failed attempt whose error kind is in the retryable set is retried
//! after `base_delay * 2^n` (n = 0 for the first retry). When attempts run
//! out the last error is returned as-is.
//!
//! ## Example
//!
//! ```rust,ignore
//! use armature_resilience::{ErrorKind, ErrorSet, RetryConfig, RetryPolicy};
//! use std::time::Duration;
//!
//! let retry = RetryPolicy::new(
//!     RetryConfig::new(4)
//!         .base_delay(Duration::from_millis(100))
//!         .retry_on(ErrorSet::only([ErrorKind::Named("network"), ErrorKind::OperationTimeout])),
//! );
//!
//! let profile = retry.execute(|| profile_client.fetch(user_id)).await?;
//! ```

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::classify::{Classify, ErrorSet};
use crate::clock::{Sleeper, TokioSleeper};
use crate::error::{ResilienceError, Result};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Name for logging.
    pub name: String,
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Option<Duration>,
    /// Error kinds that are retried.
    pub retryable: ErrorSet,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: None,
            retryable: ErrorSet::All,
        }
    }
}

impl RetryConfig {
    /// Create new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the base delay.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Cap every delay at `max`.
    pub fn max_delay(mut self, max: Duration) -> Self {
        self.max_delay = Some(max);
        self
    }

    /// Set the retryable error kinds.
    pub fn retry_on(mut self, retryable: ErrorSet) -> Self {
        self.retryable = retryable;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ResilienceError::config(format!(
                "retry '{}': max_attempts must be at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

/// Retry executor.
///
/// Holds no state between calls; the attempt counter lives in each
/// [`execute`](Self::execute) call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryPolicy {
    /// Create a new retry executor sleeping on the tokio timer.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is 0.
    pub fn new(config: RetryConfig) -> Self {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    /// Create a retry executor using `sleeper` between attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is 0.
    pub fn with_sleeper(config: RetryConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        assert!(config.max_attempts > 0, "Max attempts must be at least 1");
        Self { config, sleeper }
    }

    /// Create a retry executor, returning a configuration error instead of
    /// panicking.
    pub fn try_new(config: RetryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Create with default configuration.
    pub fn default_retry() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay before retry number `attempt` (0-indexed):
    /// `base_delay * 2^attempt`, saturating, capped by `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let delay = self.config.base_delay.saturating_mul(factor);
        match self.config.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    /// Execute with retry logic.
    ///
    /// Non-retryable errors are returned from the attempt that produced
    /// them. Dropping the returned future during a delay abandons the
    /// remaining attempts.
    pub async fn execute<F, Fut, T, E>(&self, mut f: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Classify + Display,
    {
        let mut attempt: u32 = 0;

        loop {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(name = %self.config.name, attempt = attempt + 1, "Retry succeeded");
                    }
                    return Ok(result);
                }
                Err(e) => {
                    let kind = e.kind();
                    if !self.config.retryable.contains(kind) {
                        debug!(
                            name = %self.config.name,
                            attempt = attempt + 1,
                            kind = %kind,
                            error = %e,
                            "Error is not retryable"
                        );
                        return Err(e);
                    }

                    if attempt + 1 >= self.config.max_attempts {
                        warn!(
                            name = %self.config.name,
                            attempt = attempt + 1,
                            max_attempts = self.config.max_attempts,
                            error = %e,
                            "Final retry attempt failed"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    debug!(
                        name = %self.config.name,
                        attempt = attempt + 1,
                        delay = ?delay,
                        error = %e,
                        "Retry attempt failed, waiting before retry"
                    );

                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
