//! Bulkhead pattern for resource isolation.
//!
//! The bulkhead caps the number of in-flight calls against one resource.
//! Admission is a non-blocking try on a counting semaphore: when every slot
//! is taken the call is rejected with `BulkheadFull` instead of waiting.
//!
//! ## Example
//!
//! ```rust,ignore
//! use armature_resilience::{Bulkhead, BulkheadConfig};
//!
//! let bulkhead = Bulkhead::new(BulkheadConfig::new("reports", 4));
//!
//! let report = bulkhead.call(|| render_report(id)).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use crate::error::{ResilienceError, Result};

/// Bulkhead configuration.
#[derive(Debug, Clone)]
pub struct BulkheadConfig {
    /// Name of the bulkhead (for logging/stats).
    pub name: String,
    /// Maximum concurrent executions.
    pub max_concurrent: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_concurrent: 10,
        }
    }
}

impl BulkheadConfig {
    /// Create a new configuration.
    pub fn new(name: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            name: name.into(),
            max_concurrent,
        }
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(ResilienceError::config(format!(
                "bulkhead '{}': max_concurrent must be greater than 0",
                self.name
            )));
        }
        if self.max_concurrent > Semaphore::MAX_PERMITS {
            return Err(ResilienceError::config(format!(
                "bulkhead '{}': max_concurrent exceeds {}",
                self.name,
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }
}

/// Bulkhead for limiting concurrent access.
pub struct Bulkhead {
    config: BulkheadConfig,
    semaphore: Semaphore,
    in_flight: AtomicUsize,
    total_calls: AtomicU64,
    total_rejections: AtomicU64,
}

impl Bulkhead {
    /// Create a new bulkhead.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent` is 0 or above the semaphore limit.
    pub fn new(config: BulkheadConfig) -> Arc<Self> {
        assert!(
            config.max_concurrent > 0,
            "Max concurrent must be greater than 0"
        );

        info!(
            name = %config.name,
            max_concurrent = config.max_concurrent,
            "Bulkhead initialized"
        );

        Arc::new(Self {
            semaphore: Semaphore::new(config.max_concurrent),
            config,
            in_flight: AtomicUsize::new(0),
            total_calls: AtomicU64::new(0),
            total_rejections: AtomicU64::new(0),
        })
    }

    /// Create a bulkhead, returning a configuration error instead of
    /// panicking.
    pub fn try_new(config: BulkheadConfig) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Get the bulkhead name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the concurrency cap.
    pub fn max_concurrent(&self) -> usize {
        self.config.max_concurrent
    }

    /// Get the number of calls currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Get the number of free slots.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Check if the bulkhead has capacity.
    pub fn has_capacity(&self) -> bool {
        self.available_slots() > 0
    }

    /// Take a slot or fail with `BulkheadFull`. Never waits.
    ///
    /// The slot is returned when the permit is released or dropped.
    pub fn acquire(&self) -> Result<BulkheadPermit<'_>> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);

        match self.semaphore.try_acquire() {
            Ok(permit) => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                Ok(BulkheadPermit {
                    bulkhead: self,
                    _permit: permit,
                })
            }
            Err(_) => {
                self.total_rejections.fetch_add(1, Ordering::Relaxed);
                debug!(
                    name = %self.config.name,
                    max_concurrent = self.config.max_concurrent,
                    "Bulkhead full, rejecting call"
                );
                Err(ResilienceError::bulkhead_full(
                    &self.config.name,
                    self.config.max_concurrent,
                ))
            }
        }
    }

    /// Execute with bulkhead protection.
    ///
    /// The slot is released on every exit path, including when the returned
    /// future is dropped mid-call.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<ResilienceError>,
    {
        let permit = self.acquire()?;
        let result = f().await;
        permit.release();
        result
    }

    /// Decrement `in_flight`, returning false if it was already zero.
    fn release_slot(&self) -> bool {
        let released = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !released {
            warn!(
                name = %self.config.name,
                "Bulkhead slot released with nothing in flight"
            );
        }
        released
    }

    /// Get bulkhead statistics.
    pub fn stats(&self) -> BulkheadStats {
        BulkheadStats {
            name: self.config.name.clone(),
            max_concurrent: self.config.max_concurrent,
            in_flight: self.in_flight(),
            available_slots: self.available_slots(),
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_rejections: self.total_rejections.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Bulkhead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bulkhead")
            .field("name", &self.config.name)
            .field("max_concurrent", &self.config.max_concurrent)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// A held bulkhead slot.
///
/// Released exactly once: either explicitly through
/// [`release`](Self::release), which consumes the permit, or on drop.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct BulkheadPermit<'a> {
    bulkhead: &'a Bulkhead,
    _permit: SemaphorePermit<'a>,
}

impl BulkheadPermit<'_> {
    /// Return the slot to the bulkhead.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for BulkheadPermit<'_> {
    fn drop(&mut self) {
        // The semaphore permit is returned after this runs, keeping
        // in_flight <= max_concurrent.
        let _ = self.bulkhead.release_slot();
    }
}

impl std::fmt::Debug for BulkheadPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkheadPermit")
            .field("bulkhead", &self.bulkhead.config.name)
            .finish()
    }
}

/// Bulkhead statistics.
#[derive(Debug, Clone)]
pub struct BulkheadStats {
    /// Bulkhead name.
    pub name: String,
    /// Maximum concurrent executions.
    pub max_concurrent: usize,
    /// Current in-flight executions.
    pub in_flight: usize,
    /// Free slots.
    pub available_slots: usize,
    /// Total admission attempts.
    pub total_calls: u64,
    /// Total rejections.
    pub total_rejections: u64,
}

impl BulkheadStats {
    /// Calculate utilization (0.0 - 1.0).
    pub fn utilization(&self) -> f64 {
        self.in_flight as f64 / self.max_concurrent as f64
    }
}
