//! Guard composition.
//!
//! A [`ResiliencePipeline`] is assembled once from optional guards and then
//! wraps every call in the same fixed order, outermost first:
//!
//! ```text
//! Fallback → RateLimiter → Bulkhead → CircuitBreaker → RetryPolicy → TimeLimiter → operation
//! ```
//!
//! - Fallback sees every error from the layers below, rejections included.
//! - The rate limiter rejects excess load before a bulkhead slot is taken.
//! - The bulkhead slot is held for the whole guarded call, retries included,
//!   and released on every exit path.
//! - The circuit breaker counts one failure per exhausted retry sequence and
//!   ignores rejections raised below it.
//! - The time limiter bounds each individual attempt.
//!
//! ## Example
//!
//! ```rust,ignore
//! use armature_resilience::prelude::*;
//! use std::time::Duration;
//!
//! let limiter = RateLimiter::new(RateLimiterConfig::new("pricing", 100.0, 50.0));
//!
//! let pipeline = ResiliencePipeline::builder("pricing")
//!     .fallback(Fallback::value(Price::unavailable()))
//!     .rate_limiter(limiter.clone())
//!     .bulkhead(Bulkhead::new(BulkheadConfig::new("pricing", 8)))
//!     .time_limiter(TimeLimiter::with_timeout(Duration::from_millis(800)))
//!     .build();
//!
//! let price = pipeline.execute(|| pricing_client.quote(sku)).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::bulkhead::Bulkhead;
use crate::circuit_breaker::CircuitBreaker;
use crate::classify::GuardError;
use crate::fallback::Fallback;
use crate::rate_limiter::RateLimiter;
use crate::retry::RetryPolicy;
use crate::time_limiter::TimeLimiter;

/// A fixed chain of guards around an operation.
pub struct ResiliencePipeline<T, E> {
    name: String,
    fallback: Option<Fallback<T, E>>,
    rate_limiter: Option<Arc<RateLimiter>>,
    bulkhead: Option<Arc<Bulkhead>>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    retry: Option<RetryPolicy>,
    time_limiter: Option<TimeLimiter>,
}

impl<T, E> ResiliencePipeline<T, E>
where
    T: Clone,
    E: GuardError,
{
    /// Start building a pipeline.
    pub fn builder(name: impl Into<String>) -> ResiliencePipelineBuilder<T, E> {
        ResiliencePipelineBuilder::new(name)
    }

    /// Get the pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The circuit breaker, if configured.
    pub fn circuit_breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.circuit_breaker.as_ref()
    }

    /// The rate limiter, if configured.
    pub fn rate_limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.rate_limiter.as_ref()
    }

    /// The bulkhead, if configured.
    pub fn bulkhead(&self) -> Option<&Arc<Bulkhead>> {
        self.bulkhead.as_ref()
    }

    /// Execute `f` through every configured guard.
    ///
    /// `f` may be invoked more than once when a retry policy is configured,
    /// and not at all when a guard rejects the call.
    pub async fn execute<F, Fut>(&self, f: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match &self.fallback {
            Some(fallback) => fallback.call(|| self.admitted(&f)).await,
            None => self.admitted(&f).await,
        }
    }

    async fn admitted<F, Fut>(&self, f: &F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire()?;
        }

        let _permit = match &self.bulkhead {
            Some(bulkhead) => Some(bulkhead.acquire()?),
            None => None,
        };

        match &self.circuit_breaker {
            Some(breaker) => breaker.call(|| self.retried(f)).await,
            None => self.retried(f).await,
        }
    }

    async fn retried<F, Fut>(&self, f: &F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match &self.retry {
            Some(retry) => retry.execute(|| self.limited(f)).await,
            None => self.limited(f).await,
        }
    }

    async fn limited<F, Fut>(&self, f: &F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match &self.time_limiter {
            Some(limiter) => limiter.run(f).await,
            None => f().await,
        }
    }
}

impl<T, E> std::fmt::Debug for ResiliencePipeline<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResiliencePipeline")
            .field("name", &self.name)
            .field("fallback", &self.fallback.is_some())
            .field("rate_limiter", &self.rate_limiter)
            .field("bulkhead", &self.bulkhead)
            .field("circuit_breaker", &self.circuit_breaker)
            .field("retry", &self.retry.is_some())
            .field("time_limiter", &self.time_limiter)
            .finish()
    }
}

/// Builder for [`ResiliencePipeline`].
///
/// Guards may be added in any order; the pipeline always applies them in
/// its fixed order.
pub struct ResiliencePipelineBuilder<T, E> {
    pipeline: ResiliencePipeline<T, E>,
}

impl<T, E> ResiliencePipelineBuilder<T, E>
where
    T: Clone,
    E: GuardError,
{
    /// Create a builder with no guards.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pipeline: ResiliencePipeline {
                name: name.into(),
                fallback: None,
                rate_limiter: None,
                bulkhead: None,
                circuit_breaker: None,
                retry: None,
                time_limiter: None,
            },
        }
    }

    /// Add a fallback.
    pub fn fallback(mut self, fallback: Fallback<T, E>) -> Self {
        self.pipeline.fallback = Some(fallback);
        self
    }

    /// Add a (possibly shared) rate limiter.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.pipeline.rate_limiter = Some(limiter);
        self
    }

    /// Add a (possibly shared) bulkhead.
    pub fn bulkhead(mut self, bulkhead: Arc<Bulkhead>) -> Self {
        self.pipeline.bulkhead = Some(bulkhead);
        self
    }

    /// Add a circuit breaker.
    pub fn circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.pipeline.circuit_breaker = Some(breaker);
        self
    }

    /// Add a retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.pipeline.retry = Some(retry);
        self
    }

    /// Add a time limiter.
    pub fn time_limiter(mut self, limiter: TimeLimiter) -> Self {
        self.pipeline.time_limiter = Some(limiter);
        self
    }

    /// Finish the pipeline.
    pub fn build(self) -> ResiliencePipeline<T, E> {
        let pipeline = self.pipeline;
        debug!(
            name = %pipeline.name,
            fallback = pipeline.fallback.is_some(),
            rate_limiter = pipeline.rate_limiter.is_some(),
            bulkhead = pipeline.bulkhead.is_some(),
            circuit_breaker = pipeline.circuit_breaker.is_some(),
            retry = pipeline.retry.is_some(),
            time_limiter = pipeline.time_limiter.is_some(),
            "Resilience pipeline built"
        );
        pipeline
    }
}
