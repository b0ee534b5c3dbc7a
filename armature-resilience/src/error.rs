//! Error types raised by resilience guards.

use std::time::Duration;
use thiserror::Error;

use crate::classify::ErrorKind;

/// Result type for guard operations that only fail with guard errors.
pub type Result<T> = std::result::Result<T, ResilienceError>;

/// Errors raised by the guards themselves.
///
/// Failures of the wrapped operation are never converted into this type by a
/// guard; they travel through unchanged. Application error types embed this
/// enum through `From<ResilienceError>` so one error type flows through a
/// whole guard stack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResilienceError {
    /// The circuit breaker rejected the call without attempting it.
    #[error("Circuit breaker '{name}' is open, call rejected")]
    CircuitOpen {
        /// Circuit breaker name.
        name: String,
    },

    /// The rate limiter had no token available.
    #[error("Rate limit '{name}' exceeded. Retry after {retry_after:?}")]
    RateLimitExceeded {
        /// Rate limiter name.
        name: String,
        /// Time until the next token becomes available.
        retry_after: Duration,
    },

    /// The bulkhead had no free slot.
    #[error("Bulkhead '{name}' is full ({max_concurrent} concurrent calls)")]
    BulkheadFull {
        /// Bulkhead name.
        name: String,
        /// Configured concurrency cap.
        max_concurrent: usize,
    },

    /// The time limiter cancelled the operation.
    #[error("Operation '{operation}' timed out after {elapsed:?} (limit {timeout:?})")]
    OperationTimeout {
        /// Name of the timed-out operation.
        operation: String,
        /// Configured deadline.
        timeout: Duration,
        /// Time spent before cancellation.
        elapsed: Duration,
    },

    /// A guard was built from invalid parameters.
    #[error("Resilience configuration error: {0}")]
    Configuration(String),
}

impl ResilienceError {
    /// Create a circuit open error.
    pub fn circuit_open(name: impl Into<String>) -> Self {
        Self::CircuitOpen { name: name.into() }
    }

    /// Create a rate limit exceeded error.
    pub fn rate_limited(name: impl Into<String>, retry_after: Duration) -> Self {
        Self::RateLimitExceeded {
            name: name.into(),
            retry_after,
        }
    }

    /// Create a bulkhead full error.
    pub fn bulkhead_full(name: impl Into<String>, max_concurrent: usize) -> Self {
        Self::BulkheadFull {
            name: name.into(),
            max_concurrent,
        }
    }

    /// Create an operation timeout error.
    pub fn operation_timeout(
        operation: impl Into<String>,
        timeout: Duration,
        elapsed: Duration,
    ) -> Self {
        Self::OperationTimeout {
            operation: operation.into(),
            timeout,
            elapsed,
        }
    }

    /// Create a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// The discriminator of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            Self::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Self::BulkheadFull { .. } => ErrorKind::BulkheadFull,
            Self::OperationTimeout { .. } => ErrorKind::OperationTimeout,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Check if this error is an admission rejection (the guarded
    /// operation was never started).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::CircuitOpen { .. } | Self::RateLimitExceeded { .. } | Self::BulkheadFull { .. }
        )
    }

    /// Check if this is a circuit open error.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::OperationTimeout { .. })
    }

    /// Get the retry-after hint if this is a rate limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections() {
        assert!(ResilienceError::circuit_open("db").is_rejection());
        assert!(ResilienceError::rate_limited("api", Duration::from_millis(100)).is_rejection());
        assert!(ResilienceError::bulkhead_full("pool", 4).is_rejection());

        let timeout = ResilienceError::operation_timeout(
            "fetch",
            Duration::from_millis(100),
            Duration::from_millis(101),
        );
        assert!(!timeout.is_rejection());
        assert!(timeout.is_timeout());
        assert!(!ResilienceError::config("bad").is_rejection());
    }

    #[test]
    fn test_retry_after() {
        let error = ResilienceError::rate_limited("api", Duration::from_millis(200));
        assert_eq!(error.retry_after(), Some(Duration::from_millis(200)));
        assert_eq!(ResilienceError::circuit_open("db").retry_after(), None);
    }

    #[test]
    fn test_display_carries_context() {
        let error = ResilienceError::operation_timeout(
            "fetch_user",
            Duration::from_millis(100),
            Duration::from_millis(100),
        );
        let message = error.to_string();
        assert!(message.contains("fetch_user"));
        assert!(message.contains("100ms"));

        assert_eq!(
            ResilienceError::circuit_open("payments").to_string(),
            "Circuit breaker 'payments' is open, call rejected"
        );
    }
}
