//! The protected upstream call as used by the rest of the application.

use std::sync::Arc;

use crate::config::UpstreamConfig;
use crate::resilience::invoker::ProtectedInvoker;
use crate::resilience::timeouts::{BoundedCaller, TimeLimiter};
use crate::upstream::fetcher::RemoteFetcher;

/// Retrieves the first upstream item behind a circuit breaker.
pub struct ProtectedService<L = TimeLimiter> {
    invoker: Arc<ProtectedInvoker<L>>,
    fetcher: RemoteFetcher,
    breaker: String,
    fallback: String,
}

impl<L: BoundedCaller> ProtectedService<L> {
    pub fn new(invoker: Arc<ProtectedInvoker<L>>, fetcher: RemoteFetcher, config: &UpstreamConfig) -> Self {
        Self {
            invoker,
            fetcher,
            breaker: config.breaker.clone(),
            fallback: config.fallback.clone(),
        }
    }

    /// First item served at `url`, or the fallback.
    ///
    /// An empty array is a successful call with nothing to return and
    /// also yields the fallback.
    pub async fn retrieve(&self, url: &str) -> String {
        let first = self
            .invoker
            .invoke(
                &self.breaker,
                self.fetcher.fetch_first(url),
                Some(self.fallback.clone()),
            )
            .await;

        first.unwrap_or_else(|| self.fallback.clone())
    }
}
