//! HTTP fetcher for the protected upstream.
//!
//! # Responsibilities
//! - One GET per call, `Accept: application/json`
//! - Decode the body as a JSON array of strings
//! - Hand back the first element
//!
//! Carries no timeout of its own; the time limiter bounds it.

use reqwest::header::ACCEPT;
use thiserror::Error;

/// Errors that can occur while fetching from the upstream.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Body was not a JSON array of strings.
    #[error("bad payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Decode a response body.
///
/// An empty body counts as a single empty element.
pub fn decode_body(body: &str) -> Result<Vec<String>, FetchError> {
    if body.is_empty() {
        return Ok(vec![String::new()]);
    }
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, "Bad deserialization of upstream payload");
        FetchError::Decode(e)
    })
}

#[derive(Debug, Clone, Default)]
pub struct RemoteFetcher {
    client: reqwest::Client,
}

impl RemoteFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `url` and decode the whole array.
    pub async fn fetch_all(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .inspect_err(|e| tracing::error!(url = %url, error = %e, "Upstream request failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let items = decode_body(&body)?;
        for item in &items {
            tracing::debug!(item = %item, "Upstream item");
        }
        Ok(items)
    }

    /// GET `url` and return its first element, `None` for an empty array.
    pub async fn fetch_first(&self, url: &str) -> Result<Option<String>, FetchError> {
        Ok(self.fetch_all(url).await?.into_iter().next())
    }
}
