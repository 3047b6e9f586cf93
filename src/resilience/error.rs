//! Per-call resilience errors.
//!
//! None of these reach callers of `ProtectedInvoker::invoke`; they are
//! logged and replaced by the fallback. Rejections never start a call and
//! surface as `CallResult::Rejected` instead.

use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by a protected operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ResilienceError {
    /// The operation itself failed.
    #[error("operation failed: {0}")]
    Operation(#[source] BoxError),

    /// The operation did not finish within the bounded duration.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl ResilienceError {
    /// Metric label for this failure mode.
    pub fn kind(&self) -> &'static str {
        match self {
            ResilienceError::Operation(_) => "failure",
            ResilienceError::Timeout(_) => "timeout",
        }
    }
}
