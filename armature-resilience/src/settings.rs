//! Serializable guard settings.
//!
//! [`ResilienceSettings`] describes a whole pipeline in a form any serde
//! format can carry. Durations are written as whole milliseconds. Sections
//! that are absent leave the corresponding guard out.
//!
//! ```json
//! {
//!   "name": "inventory",
//!   "circuit_breaker": { "failure_threshold": 3, "recovery_timeout": 10000 },
//!   "retry": { "max_attempts": 4, "base_delay": 200, "max_delay": 2000 },
//!   "bulkhead": { "max_concurrent": 16 },
//!   "time_limiter": { "timeout": 1500 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::bulkhead::{Bulkhead, BulkheadConfig};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::classify::GuardError;
use crate::clock::MonotonicClock;
use crate::error::Result;
use crate::pipeline::ResiliencePipelineBuilder;
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::time_limiter::{TimeLimiter, TimeLimiterConfig};

/// Settings for a full set of guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceSettings {
    /// Name given to every guard built from these settings.
    pub name: String,
    /// Circuit breaker section.
    pub circuit_breaker: Option<CircuitBreakerSettings>,
    /// Retry section.
    pub retry: Option<RetrySettings>,
    /// Rate limiter section.
    pub rate_limiter: Option<RateLimiterSettings>,
    /// Bulkhead section.
    pub bulkhead: Option<BulkheadSettings>,
    /// Time limiter section.
    pub time_limiter: Option<TimeLimiterSettings>,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            circuit_breaker: None,
            retry: None,
            rate_limiter: None,
            bulkhead: None,
            time_limiter: None,
        }
    }
}

impl ResilienceSettings {
    /// Check every present section.
    pub fn validate(&self) -> Result<()> {
        if let Some(cb) = &self.circuit_breaker {
            cb.to_config(&self.name).validate()?;
        }
        if let Some(retry) = &self.retry {
            retry.to_config(&self.name).validate()?;
        }
        if let Some(limiter) = &self.rate_limiter {
            limiter.to_config(&self.name).validate()?;
        }
        if let Some(bulkhead) = &self.bulkhead {
            bulkhead.to_config(&self.name).validate()?;
        }
        if let Some(limiter) = &self.time_limiter {
            limiter.to_config(&self.name).validate()?;
        }
        Ok(())
    }

    /// Build the configured guards into a pipeline builder.
    ///
    /// Guards read the runtime clock. A fallback, if wanted, is added to the
    /// returned builder in code.
    pub fn pipeline<T, E>(&self) -> Result<ResiliencePipelineBuilder<T, E>>
    where
        T: Clone,
        E: GuardError,
    {
        self.validate()?;

        let mut builder = ResiliencePipelineBuilder::new(self.name.clone());
        if let Some(limiter) = &self.rate_limiter {
            builder = builder.rate_limiter(RateLimiter::try_new(
                limiter.to_config(&self.name),
                Arc::new(MonotonicClock),
            )?);
        }
        if let Some(bulkhead) = &self.bulkhead {
            builder = builder.bulkhead(Bulkhead::try_new(bulkhead.to_config(&self.name))?);
        }
        if let Some(cb) = &self.circuit_breaker {
            builder = builder.circuit_breaker(CircuitBreaker::try_new(
                cb.to_config(&self.name),
                Arc::new(MonotonicClock),
            )?);
        }
        if let Some(retry) = &self.retry {
            builder = builder.retry(RetryPolicy::try_new(retry.to_config(&self.name))?);
        }
        if let Some(limiter) = &self.time_limiter {
            builder = builder.time_limiter(TimeLimiter::new(limiter.to_config(&self.name)));
        }
        Ok(builder)
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before opening.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Time spent open before a probe is allowed, in milliseconds.
    #[serde(with = "millis", default = "default_recovery_timeout")]
    pub recovery_timeout: Duration,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout() -> Duration {
    Duration::from_secs(30)
}

impl CircuitBreakerSettings {
    /// Convert into a breaker configuration.
    pub fn to_config(&self, name: &str) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new(name)
            .failure_threshold(self.failure_threshold)
            .recovery_timeout(self.recovery_timeout)
    }
}

/// Retry settings.
///
/// Every error kind is retryable when built from settings; narrow the set
/// with [`RetryConfig::retry_on`] in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    #[serde(with = "millis", default = "default_base_delay")]
    pub base_delay: Duration,
    /// Cap on any single delay, in milliseconds.
    #[serde(with = "millis_option", default)]
    pub max_delay: Option<Duration>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

impl RetrySettings {
    /// Convert into a retry configuration.
    pub fn to_config(&self, name: &str) -> RetryConfig {
        let config = RetryConfig::new(self.max_attempts)
            .name(name)
            .base_delay(self.base_delay);
        match self.max_delay {
            Some(max) => config.max_delay(max),
            None => config,
        }
    }
}

/// Rate limiter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterSettings {
    /// Bucket capacity.
    pub max_tokens: f64,
    /// Tokens added per second.
    pub refill_rate: f64,
}

impl RateLimiterSettings {
    /// Convert into a rate limiter configuration.
    pub fn to_config(&self, name: &str) -> RateLimiterConfig {
        RateLimiterConfig::new(name, self.max_tokens, self.refill_rate)
    }
}

/// Bulkhead settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkheadSettings {
    /// Maximum concurrent calls.
    pub max_concurrent: usize,
}

impl BulkheadSettings {
    /// Convert into a bulkhead configuration.
    pub fn to_config(&self, name: &str) -> BulkheadConfig {
        BulkheadConfig::new(name, self.max_concurrent)
    }
}

/// Time limiter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLimiterSettings {
    /// Per-call deadline, in milliseconds.
    #[serde(with = "millis")]
    pub timeout: Duration,
}

impl TimeLimiterSettings {
    /// Convert into a time limiter configuration.
    pub fn to_config(&self, name: &str) -> TimeLimiterConfig {
        TimeLimiterConfig::new(self.timeout).name(name)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod millis_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
