//! Error classification.
//!
//! Retry and fallback decide what to act on by error kind rather than by
//! concrete type. Every error that flows through a guard implements
//! [`Classify`], which maps it onto an [`ErrorKind`]; an [`ErrorSet`] then
//! answers whether that kind is selected.
//!
//! ## Example
//!
//! ```rust
//! use armature_resilience::{Classify, ErrorKind, ErrorSet, ResilienceError};
//!
//! #[derive(Debug)]
//! enum ApiError {
//!     Network(String),
//!     NotFound,
//!     Guard(ResilienceError),
//! }
//!
//! impl From<ResilienceError> for ApiError {
//!     fn from(e: ResilienceError) -> Self {
//!         ApiError::Guard(e)
//!     }
//! }
//!
//! impl Classify for ApiError {
//!     fn resilience_error(&self) -> Option<&ResilienceError> {
//!         match self {
//!             ApiError::Guard(e) => Some(e),
//!             _ => None,
//!         }
//!     }
//!
//!     fn kind(&self) -> ErrorKind {
//!         match self {
//!             ApiError::Network(_) => ErrorKind::Named("network"),
//!             ApiError::NotFound => ErrorKind::Named("not_found"),
//!             ApiError::Guard(e) => e.kind(),
//!         }
//!     }
//! }
//!
//! let retryable = ErrorSet::only([ErrorKind::Named("network"), ErrorKind::OperationTimeout]);
//! assert!(retryable.contains(ApiError::Network("reset".into()).kind()));
//! assert!(!retryable.contains(ApiError::NotFound.kind()));
//! ```

use std::fmt;

use crate::error::ResilienceError;

/// Error discriminator used for classification.
///
/// `Resilience`, `Rejection` and `Operation` are families: they match every
/// kind below them, so a set containing `Rejection` selects circuit open,
/// rate limit and bulkhead errors alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Circuit breaker rejection.
    CircuitOpen,
    /// Rate limiter rejection.
    RateLimitExceeded,
    /// Bulkhead rejection.
    BulkheadFull,
    /// Time limiter expiry.
    OperationTimeout,
    /// Invalid guard configuration.
    Configuration,
    /// Any failure of the wrapped operation without a finer kind.
    Operation,
    /// An application-defined operation failure kind.
    Named(&'static str),
    /// Family: any admission rejection.
    Rejection,
    /// Family: any error raised by a guard.
    Resilience,
}

impl ErrorKind {
    /// Check whether `actual` is this kind or belongs to this family.
    pub fn matches(self, actual: ErrorKind) -> bool {
        match self {
            Self::Resilience => matches!(
                actual,
                Self::CircuitOpen
                    | Self::RateLimitExceeded
                    | Self::BulkheadFull
                    | Self::OperationTimeout
                    | Self::Configuration
                    | Self::Rejection
                    | Self::Resilience
            ),
            Self::Rejection => matches!(
                actual,
                Self::CircuitOpen | Self::RateLimitExceeded | Self::BulkheadFull | Self::Rejection
            ),
            Self::Operation => matches!(actual, Self::Operation | Self::Named(_)),
            kind => kind == actual,
        }
    }

    /// Check if this kind is an admission rejection.
    pub fn is_rejection(self) -> bool {
        Self::Rejection.matches(self)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CircuitOpen => write!(f, "circuit_open"),
            Self::RateLimitExceeded => write!(f, "rate_limit_exceeded"),
            Self::BulkheadFull => write!(f, "bulkhead_full"),
            Self::OperationTimeout => write!(f, "operation_timeout"),
            Self::Configuration => write!(f, "configuration"),
            Self::Operation => write!(f, "operation"),
            Self::Named(name) => write!(f, "{}", name),
            Self::Rejection => write!(f, "rejection"),
            Self::Resilience => write!(f, "resilience"),
        }
    }
}

/// Classification function for errors passing through guards.
pub trait Classify {
    /// The guard error carried by this value, if any.
    fn resilience_error(&self) -> Option<&ResilienceError>;

    /// The kind of this error. Defaults to the guard error's kind, or
    /// [`ErrorKind::Operation`] for everything else.
    fn kind(&self) -> ErrorKind {
        self.resilience_error()
            .map_or(ErrorKind::Operation, ResilienceError::kind)
    }
}

impl Classify for ResilienceError {
    fn resilience_error(&self) -> Option<&ResilienceError> {
        Some(self)
    }
}

/// Bound for error types that can travel through every guard: classifiable,
/// constructible from guard rejections, and printable for logs.
pub trait GuardError: Classify + From<ResilienceError> + fmt::Display {}

impl<E> GuardError for E where E: Classify + From<ResilienceError> + fmt::Display {}

/// A set of error kinds selecting which failures a guard acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorSet {
    /// Every error.
    #[default]
    All,
    /// No error.
    None,
    /// Only the listed kinds (and members of listed families).
    Only(Vec<ErrorKind>),
    /// Everything except the listed kinds (and members of listed families).
    Except(Vec<ErrorKind>),
}

impl ErrorSet {
    /// Select only the given kinds.
    pub fn only(kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        Self::Only(kinds.into_iter().collect())
    }

    /// Select everything but the given kinds.
    pub fn except(kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        Self::Except(kinds.into_iter().collect())
    }

    /// Check whether the set selects `kind`.
    pub fn contains(&self, kind: ErrorKind) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Only(kinds) => kinds.iter().any(|k| k.matches(kind)),
            Self::Except(kinds) => !kinds.iter().any(|k| k.matches(kind)),
        }
    }

    /// Check whether the set selects the given error.
    pub fn matches<E: Classify + ?Sized>(&self, error: &E) -> bool {
        self.contains(error.kind())
    }
}
