//! Fallback pattern for graceful degradation.
//!
//! A fallback substitutes a degraded result when the primary operation
//! fails with an error kind it is configured for. It either calls a fallback
//! operation with the original arguments and the caught error, or returns a
//! fixed value. Errors outside its set propagate unchanged.
//!
//! ## Example
//!
//! ```rust,ignore
//! use armature_resilience::{ErrorKind, ErrorSet, Fallback};
//!
//! let fallback = Fallback::builder()
//!     .name("recommendations")
//!     .on(ErrorSet::only([ErrorKind::Resilience]))
//!     .operation(|user_id: u64, _error| async move { cache.recommendations(user_id).await })
//!     .build()?;
//!
//! let items = fallback
//!     .guard(user_id, |user_id| recommender.fetch(user_id))
//!     .await?;
//! ```

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::classify::{Classify, ErrorSet};
use crate::error::{ResilienceError, Result};

/// Type alias for an async fallback function receiving the original
/// arguments and the caught error.
pub type FallbackFn<A, T, E> = Arc<dyn Fn(A, E) -> FallbackFuture<T, E> + Send + Sync>;

/// Future returned by a [`FallbackFn`].
pub type FallbackFuture<T, E> = Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send>>;

fn boxed<A, T, E, F, Fut>(f: F) -> FallbackFn<A, T, E>
where
    F: Fn(A, E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
{
    Arc::new(move |args: A, error: E| -> FallbackFuture<T, E> { Box::pin(f(args, error)) })
}

/// What the fallback produces.
enum FallbackAction<A, T, E> {
    Operation(FallbackFn<A, T, E>),
    Value(T),
}

impl<A, T: Clone, E> Clone for FallbackAction<A, T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Operation(f) => Self::Operation(Arc::clone(f)),
            Self::Value(v) => Self::Value(v.clone()),
        }
    }
}

/// Fallback handler that provides alternative behavior.
///
/// `A` is the argument type handed to both the primary and the fallback
/// operation; it defaults to `()` for argument-less calls.
pub struct Fallback<T, E, A = ()> {
    name: String,
    action: FallbackAction<A, T, E>,
    on: ErrorSet,
}

impl<T, E, A> Fallback<T, E, A>
where
    T: Clone,
    E: Classify + Display,
{
    /// Create a fallback returning a fixed value on any error.
    pub fn value(value: T) -> Self {
        Self {
            name: "default".to_string(),
            action: FallbackAction::Value(value),
            on: ErrorSet::All,
        }
    }

    /// Create a fallback calling `f` on any error.
    pub fn operation<F, Fut>(f: F) -> Self
    where
        F: Fn(A, E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        Self {
            name: "default".to_string(),
            action: FallbackAction::Operation(boxed(f)),
            on: ErrorSet::All,
        }
    }

    /// Start a builder.
    pub fn builder() -> FallbackBuilder<T, E, A> {
        FallbackBuilder::new()
    }

    /// Set the fallback name for logging.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Restrict the fallback to the given error kinds.
    pub fn on(mut self, on: ErrorSet) -> Self {
        self.on = on;
        self
    }

    /// Get the fallback name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute `primary` with `args`, falling back on a matching failure.
    pub async fn guard<F, Fut>(&self, args: A, primary: F) -> std::result::Result<T, E>
    where
        A: Clone,
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        match primary(args.clone()).await {
            Ok(result) => Ok(result),
            Err(e) if self.on.matches(&e) => {
                debug!(
                    name = %self.name,
                    kind = %e.kind(),
                    error = %e,
                    "Primary operation failed, using fallback"
                );
                match &self.action {
                    FallbackAction::Operation(f) => f(args, e).await,
                    FallbackAction::Value(value) => Ok(value.clone()),
                }
            }
            Err(e) => Err(e),
        }
    }
}

impl<T, E> Fallback<T, E, ()>
where
    T: Clone,
    E: Classify + Display,
{
    /// Execute an argument-less operation, falling back on a matching
    /// failure.
    pub async fn call<F, Fut>(&self, primary: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.guard((), |()| primary()).await
    }
}

impl<T: Clone, E, A> Clone for Fallback<T, E, A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            action: self.action.clone(),
            on: self.on.clone(),
        }
    }
}

impl<T, E, A> std::fmt::Debug for Fallback<T, E, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self.action {
            FallbackAction::Operation(_) => "operation",
            FallbackAction::Value(_) => "value",
        };
        f.debug_struct("Fallback")
            .field("name", &self.name)
            .field("action", &action)
            .field("on", &self.on)
            .finish()
    }
}

/// Builds a [`Fallback`], checking that exactly one of operation or value
/// was given.
pub struct FallbackBuilder<T, E, A = ()> {
    name: String,
    operation: Option<FallbackFn<A, T, E>>,
    value: Option<T>,
    on: ErrorSet,
}

impl<T, E, A> FallbackBuilder<T, E, A>
where
    T: Clone,
    E: Classify + Display,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            name: "default".to_string(),
            operation: None,
            value: None,
            on: ErrorSet::All,
        }
    }

    /// Set the name for logging.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Error kinds that trigger the fallback.
    pub fn on(mut self, on: ErrorSet) -> Self {
        self.on = on;
        self
    }

    /// Use an async fallback operation.
    pub fn operation<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(A, E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.operation = Some(boxed(f));
        self
    }

    /// Use a synchronous fallback function.
    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(A, E) -> std::result::Result<T, E> + Send + Sync + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.operation = Some(boxed(move |args, error| std::future::ready(f(args, error))));
        self
    }

    /// Use a fixed fallback value.
    pub fn value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    /// Use `T::default()` as the fallback value.
    pub fn default_value(self) -> Self
    where
        T: Default,
    {
        self.value(T::default())
    }

    /// Build the fallback.
    ///
    /// Fails with a configuration error when neither or both of an
    /// operation and a value were given.
    pub fn build(self) -> Result<Fallback<T, E, A>> {
        let action = match (self.operation, self.value) {
            (Some(operation), None) => FallbackAction::Operation(operation),
            (None, Some(value)) => FallbackAction::Value(value),
            (None, None) => {
                return Err(ResilienceError::config(format!(
                    "fallback '{}': either an operation or a value is required",
                    self.name
                )));
            }
            (Some(_), Some(_)) => {
                return Err(ResilienceError::config(format!(
                    "fallback '{}': an operation and a value are mutually exclusive",
                    self.name
                )));
            }
        };

        Ok(Fallback {
            name: self.name,
            action,
            on: self.on,
        })
    }
}

impl<T, E, A> Default for FallbackBuilder<T, E, A>
where
    T: Clone,
    E: Classify + Display,
{
    fn default() -> Self {
        Self::new()
    }
}
