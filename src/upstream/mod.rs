//! Upstream access.
//!
//! # Data Flow
//! ```text
//! ProtectedService::retrieve(url)
//!     → ProtectedInvoker (breaker + time limiter)
//!     → RemoteFetcher::fetch_first (GET, decode JSON array, first element)
//!     → value or fallback
//! ```

pub mod fetcher;
pub mod service;

pub use fetcher::{FetchError, RemoteFetcher};
pub use service::ProtectedService;
