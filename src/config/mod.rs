//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → breaker registry + HTTP server built from it at startup
//! ```
//!
//! # Design Decisions
//! - Config is static for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, BreakerConfig, BreakerSettings, GatewayConfig, ListenerConfig,
    ObservabilityConfig, TimeLimiterConfig, UpstreamConfig,
};
pub use validation::ValidationError;
