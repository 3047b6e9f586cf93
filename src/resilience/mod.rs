//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to upstream:
//!     → invoker.rs (ask breaker, run bounded call, record outcome, fallback)
//!     → circuit_breaker.rs (state machine over window.rs failure rate)
//!     → timeouts.rs (deadline on the call itself)
//!     → registry.rs (one breaker per identifier)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every protected call has a deadline
//! - No retries at this layer; one attempt per invocation
//! - Callers only ever see a value or the fallback

pub mod circuit_breaker;
pub mod error;
pub mod invoker;
pub mod registry;
pub mod timeouts;
pub mod window;

pub use circuit_breaker::{Admission, BreakerSnapshot, CircuitBreaker, CircuitState, CountBasedBreaker, Permit};
pub use error::ResilienceError;
pub use invoker::{CallResult, ProtectedInvoker};
pub use registry::BreakerRegistry;
pub use timeouts::{BoundedCaller, TimeLimiter};
pub use window::{Outcome, OutcomeWindow};
