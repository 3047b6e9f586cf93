//! Protected invocation: breaker gate → bounded call → outcome → fallback.
//!
//! # Data Flow
//! ```text
//! invoke(id, operation, fallback)
//!     → registry.breaker(id).try_acquire()
//!         rejected  → fallback (nothing recorded)
//!         permitted → limiter.run(operation)
//!             ok     → record Success → value
//!             err    → record Failure → fallback (error logged)
//! ```
//!
//! Exactly one acquire and at most one outcome per invocation. No retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::observability::metrics;
use crate::resilience::circuit_breaker::{Admission, CircuitBreaker, Permit};
use crate::resilience::error::{BoxError, ResilienceError};
use crate::resilience::registry::BreakerRegistry;
use crate::resilience::timeouts::{BoundedCaller, TimeLimiter};
use crate::resilience::window::Outcome;

/// Result of attempting a protected operation once.
#[derive(Debug)]
pub enum CallResult<T> {
    Value(T),
    Rejected,
    Failed(ResilienceError),
}

impl<T> CallResult<T> {
    /// The value, or `fallback` for any rejection or failure.
    pub fn or_fallback(self, fallback: T) -> T {
        match self {
            CallResult::Value(value) => value,
            CallResult::Rejected | CallResult::Failed(_) => fallback,
        }
    }
}

/// Reports a failure for a trial call abandoned before it reports back,
/// so a dropped trial cannot pin a half-open breaker. Other abandoned
/// calls leave no outcome.
struct OutcomeGuard<'a> {
    breaker: &'a dyn CircuitBreaker,
    permit: Option<Permit>,
}

impl OutcomeGuard<'_> {
    fn complete(mut self, outcome: Outcome) {
        if let Some(permit) = self.permit.take() {
            self.breaker.record_outcome(permit, outcome);
        }
    }
}

impl Drop for OutcomeGuard<'_> {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };

        tracing::debug!(
            breaker = %self.breaker.name(),
            trial = permit.is_trial(),
            "Protected call dropped before completion"
        );
        if permit.is_trial() {
            self.breaker.record_outcome(permit, Outcome::Failure);
        }
    }
}

/// Composes the breaker registry with a bounded caller.
pub struct ProtectedInvoker<L = TimeLimiter> {
    registry: Arc<BreakerRegistry>,
    limiter: L,
}

impl<L: BoundedCaller> ProtectedInvoker<L> {
    pub fn new(registry: Arc<BreakerRegistry>, limiter: L) -> Self {
        Self { registry, limiter }
    }

    pub fn registry(&self) -> &Arc<BreakerRegistry> {
        &self.registry
    }

    /// Run `operation` once through `breaker`, reporting what happened.
    pub async fn execute<Fut, T, E>(&self, breaker: &dyn CircuitBreaker, operation: Fut) -> CallResult<T>
    where
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Into<BoxError> + Send,
    {
        let permit = match breaker.try_acquire() {
            Admission::Permitted(permit) => permit,
            Admission::Rejected => {
                metrics::record_rejected(breaker.name());
                return CallResult::Rejected;
            }
        };

        let guard = OutcomeGuard { breaker, permit: Some(permit) };
        let start = Instant::now();

        match self.limiter.run(operation).await {
            Ok(value) => {
                guard.complete(Outcome::Success);
                metrics::record_call(breaker.name(), "success", start);
                CallResult::Value(value)
            }
            Err(e) => {
                guard.complete(Outcome::Failure);
                metrics::record_call(breaker.name(), e.kind(), start);
                CallResult::Failed(e)
            }
        }
    }

    /// Run `operation` under the breaker named `breaker_id`.
    ///
    /// Never fails: any rejection, error or timeout yields `fallback`.
    pub async fn invoke<Fut, T, E>(&self, breaker_id: &str, operation: Fut, fallback: T) -> T
    where
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Into<BoxError> + Send,
    {
        let breaker = match self.registry.breaker(breaker_id) {
            Ok(breaker) => breaker,
            Err(e) => {
                tracing::error!(breaker = %breaker_id, error = %e, "Circuit breaker unavailable, returning fallback");
                return fallback;
            }
        };

        match self.execute(breaker.as_ref(), operation).await {
            CallResult::Value(value) => value,
            CallResult::Rejected => {
                tracing::debug!(breaker = %breaker_id, state = %breaker.state(), "Call not permitted, returning fallback");
                fallback
            }
            CallResult::Failed(e) => {
                tracing::warn!(breaker = %breaker_id, error = %e, "Protected call failed, returning fallback");
                fallback
            }
        }
    }
}
