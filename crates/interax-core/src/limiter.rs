//! Bounded async task admission with FIFO queueing (C2).
//!
//! Built on [`tokio::sync::Semaphore`], whose waiter queue already wakes
//! tasks in submission order. The wrapper exists so "at most N concurrent"
//! and "FIFO admission" are an explicit, testable type rather than an
//! implementation detail of the runtime (§9).

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Errors raised by [`ConcurrencyLimiter`]. In practice this is never
/// observed in this pipeline: limiters are never closed while in use.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LimiterError {
    /// The limiter's semaphore was closed while a caller was waiting for
    /// admission.
    #[error("concurrency limiter is closed")]
    Closed,
}

/// A work-submission primitive parameterized by a maximum concurrency `N`.
///
/// Contract: at most `N` submitted tasks run at any instant; queued tasks
/// are admitted in FIFO order; completion order is unspecified.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimiter {
    /// Builds a limiter admitting at most `capacity` concurrent tasks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// The configured maximum concurrency.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Runs `future` once a permit is admitted, holding the permit until
    /// `future` completes.
    ///
    /// # Errors
    ///
    /// Returns [`LimiterError::Closed`] if the limiter's semaphore was
    /// closed while waiting for admission.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, LimiterError>
    where
        F: Future,
    {
        let _permit = self.semaphore.acquire().await.map_err(|_| LimiterError::Closed)?;
        Ok(future.await)
    }
}
