//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build breaker registry → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → broadcast → server drains → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
