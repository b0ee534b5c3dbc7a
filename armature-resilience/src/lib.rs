//! # Armature Resilience
//!
//! Composable guards that wrap fallible async operations.
//!
//! ## Guards
//!
//! - **Circuit Breaker**: Fail fast after repeated failures, probe after a recovery period
//! - **Retry**: Re-run failed attempts with exponential backoff
//! - **Rate Limiter**: Token bucket admission with burst capacity
//! - **Bulkhead**: Cap concurrent calls against a resource
//! - **Time Limiter**: Bound the duration of a call and cancel it on expiry
//! - **Fallback**: Substitute a degraded result for selected failures
//!
//! Every guard passes the wrapped operation's result and error through
//! unchanged and only adds its own rejection kinds ([`ResilienceError`]).
//! Time-derived state is computed on access from an injectable [`Clock`];
//! no guard runs background tasks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use armature_resilience::prelude::*;
//! use std::time::Duration;
//!
//! // Circuit breaker that opens after 5 consecutive failures
//! let circuit = CircuitBreaker::new(
//!     CircuitBreakerConfig::new("billing")
//!         .failure_threshold(5)
//!         .recovery_timeout(Duration::from_secs(30)),
//! );
//!
//! // Execute with circuit breaker protection
//! let invoice = circuit.call(|| billing_api.invoice(id)).await?;
//! ```
//!
//! ## Composition
//!
//! Guards nest in a fixed order through [`ResiliencePipeline`]:
//!
//! ```rust,ignore
//! let pipeline = ResiliencePipeline::builder("billing")
//!     .fallback(Fallback::value(Invoice::pending()))
//!     .circuit_breaker(circuit)
//!     .retry(RetryPolicy::new(RetryConfig::new(3)))
//!     .time_limiter(TimeLimiter::with_timeout(Duration::from_secs(2)))
//!     .build();
//!
//! let invoice = pipeline.execute(|| billing_api.invoice(id)).await?;
//! ```
//!
//! ## Error Types
//!
//! Operations bring their own error type. It needs to classify itself
//! ([`Classify`]), absorb guard rejections (`From<ResilienceError>`) and
//! print itself for logs; [`GuardError`] bundles the three.

pub mod bulkhead;
pub mod circuit_breaker;
pub mod classify;
pub mod clock;
pub mod error;
pub mod fallback;
pub mod pipeline;
pub mod rate_limiter;
pub mod retry;
pub mod settings;
pub mod time_limiter;

pub use bulkhead::{Bulkhead, BulkheadConfig, BulkheadPermit, BulkheadStats};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState,
};
pub use classify::{Classify, ErrorKind, ErrorSet, GuardError};
pub use clock::{Clock, ManualClock, MonotonicClock, RecordingSleeper, Sleeper, TokioSleeper};
pub use error::{ResilienceError, Result};
pub use fallback::{Fallback, FallbackBuilder, FallbackFn, FallbackFuture};
pub use pipeline::{ResiliencePipeline, ResiliencePipelineBuilder};
pub use rate_limiter::{RateLimiter, RateLimiterConfig, RateLimiterStats};
pub use retry::{RetryConfig, RetryPolicy};
pub use settings::{
    BulkheadSettings, CircuitBreakerSettings, RateLimiterSettings, ResilienceSettings,
    RetrySettings, TimeLimiterSettings,
};
pub use time_limiter::{TimeLimiter, TimeLimiterConfig, with_timeout};

/// Commonly used types.
pub mod prelude {
    pub use crate::bulkhead::{Bulkhead, BulkheadConfig};
    pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
    pub use crate::classify::{Classify, ErrorKind, ErrorSet, GuardError};
    pub use crate::error::ResilienceError;
    pub use crate::fallback::Fallback;
    pub use crate::pipeline::ResiliencePipeline;
    pub use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
    pub use crate::retry::{RetryConfig, RetryPolicy};
    pub use crate::time_limiter::{TimeLimiter, TimeLimiterConfig};
}
