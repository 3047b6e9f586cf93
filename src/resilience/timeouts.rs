//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap a protected call with a deadline
//! - Map timeouts and operation errors onto [`ResilienceError`]
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the task is suspended, not a worker thread
//! - On deadline the operation future is dropped, which cancels it at its
//!   next await point; side effects already performed are not undone

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::resilience::error::{BoxError, ResilienceError};

/// Runs an operation under a maximum duration.
pub trait BoundedCaller: Send + Sync {
    /// Configured deadline for one call.
    fn timeout(&self) -> Duration;

    /// Run `operation`; `Timeout` if it outlives [`Self::timeout`].
    fn run<Fut, T, E>(&self, operation: Fut) -> impl Future<Output = Result<T, ResilienceError>> + Send
    where
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Into<BoxError> + Send;
}

/// Stateless time limiter holding only its deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeLimiter {
    timeout: Duration,
}

impl TimeLimiter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TimeLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

impl BoundedCaller for TimeLimiter {
    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn run<Fut, T, E>(&self, operation: Fut) -> impl Future<Output = Result<T, ResilienceError>> + Send
    where
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Into<BoxError> + Send,
    {
        let limit = self.timeout;
        async move {
            match timeout(limit, operation).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(ResilienceError::Operation(e.into())),
                Err(_) => Err(ResilienceError::Timeout(limit)),
            }
        }
    }
}
