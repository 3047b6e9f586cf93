//! Resilience gateway library.
//!
//! Guards calls to an unreliable HTTP upstream with a failure-rate circuit
//! breaker, a call time limiter and a static fallback.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{BreakerRegistry, CircuitState, ProtectedInvoker};
