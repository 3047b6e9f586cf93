//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (threshold 0-100, durations > 0, sizes >= 1)
//! - Check breaker names are present and unique
//! - Check addresses and the upstream URL parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{BreakerSettings, GatewayConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("breaker '{breaker}': failure_rate_threshold {value} is outside 0..=100")]
    ThresholdOutOfRange { breaker: String, value: u8 },

    #[error("breaker '{breaker}': wait_duration_in_open_ms must be greater than zero")]
    ZeroWaitDuration { breaker: String },

    #[error("breaker '{breaker}': sliding_window_size must be at least 1")]
    EmptyWindow { breaker: String },

    #[error("breaker '{breaker}': permitted_calls_in_half_open must be at least 1")]
    NoTrialCalls { breaker: String },

    #[error("breaker name must not be empty")]
    EmptyBreakerName,

    #[error("breaker '{0}' is declared more than once")]
    DuplicateBreaker(String),

    #[error("time_limiter.timeout_ms must be greater than zero")]
    ZeroCallTimeout,

    #[error("upstream url '{url}' is invalid: {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingApiKey,
}

/// Validate the settings of one breaker.
pub fn validate_breaker(name: &str, settings: &BreakerSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.failure_rate_threshold > 100 {
        errors.push(ValidationError::ThresholdOutOfRange {
            breaker: name.to_string(),
            value: settings.failure_rate_threshold,
        });
    }
    if settings.wait_duration_in_open_ms == 0 {
        errors.push(ValidationError::ZeroWaitDuration { breaker: name.to_string() });
    }
    if settings.sliding_window_size == 0 {
        errors.push(ValidationError::EmptyWindow { breaker: name.to_string() });
    }
    if settings.permitted_calls_in_half_open == 0 {
        errors.push(ValidationError::NoTrialCalls { breaker: name.to_string() });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a whole configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_breaker("<defaults>", &config.breaker_defaults) {
        errors.extend(e);
    }

    let mut seen = HashSet::new();
    for breaker in &config.circuit_breakers {
        if breaker.name.trim().is_empty() {
            errors.push(ValidationError::EmptyBreakerName);
            continue;
        }
        if !seen.insert(breaker.name.as_str()) {
            errors.push(ValidationError::DuplicateBreaker(breaker.name.clone()));
        }
        if let Err(e) = validate_breaker(&breaker.name, &breaker.settings) {
            errors.extend(e);
        }
    }

    if config.upstream.breaker.trim().is_empty() {
        errors.push(ValidationError::EmptyBreakerName);
    }

    if config.time_limiter.timeout_ms == 0 {
        errors.push(ValidationError::ZeroCallTimeout);
    }

    match Url::parse(&config.upstream.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidUpstreamUrl {
            url: config.upstream.url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUpstreamUrl {
            url: config.upstream.url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::MissingApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
