//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifier of the breaker guarding the upstream in the default config.
pub const DEFAULT_BREAKER: &str = "greek-gods";

/// Sentinel returned when the upstream call is rejected or fails.
pub const DEFAULT_FALLBACK: &str = "FALLBACK";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, request ceiling).
    pub listener: ListenerConfig,

    /// Protected upstream endpoint.
    pub upstream: UpstreamConfig,

    /// Bounded-call settings.
    pub time_limiter: TimeLimiterConfig,

    /// Settings for breakers created on first use.
    pub breaker_defaults: BreakerSettings,

    /// Breakers created at startup.
    pub circuit_breakers: Vec<BreakerConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Administrative override API.
    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            time_limiter: TimeLimiterConfig::default(),
            breaker_defaults: BreakerSettings::default(),
            circuit_breakers: vec![BreakerConfig {
                name: DEFAULT_BREAKER.to_string(),
                settings: BreakerSettings::default(),
            }],
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Ceiling for a whole inbound request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// The remote endpoint being protected.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL answering GET with a JSON array of strings.
    pub url: String,

    /// Breaker identifier scoping this dependency.
    pub breaker: String,

    /// Value returned instead of real data when the call is rejected or fails.
    pub fallback: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8090/greek".to_string(),
            breaker: DEFAULT_BREAKER.to_string(),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }
}

/// Bounded-call configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeLimiterConfig {
    /// Maximum duration of one protected call in milliseconds.
    pub timeout_ms: u64,
}

impl TimeLimiterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TimeLimiterConfig {
    fn default() -> Self {
        Self { timeout_ms: 3000 }
    }
}

/// Tuning of a single circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerSettings {
    /// Failure percentage (0-100) at or above which the circuit opens.
    pub failure_rate_threshold: u8,

    /// Time spent OPEN before a trial call is allowed, in milliseconds.
    pub wait_duration_in_open_ms: u64,

    /// Number of recent outcomes kept; also the minimum sample to trip.
    pub sliding_window_size: usize,

    /// Trial calls allowed per HALF_OPEN episode.
    pub permitted_calls_in_half_open: u32,
}

impl BreakerSettings {
    pub fn wait_duration_in_open(&self) -> Duration {
        Duration::from_millis(self.wait_duration_in_open_ms)
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50,
            wait_duration_in_open_ms: 1000,
            sliding_window_size: 2,
            permitted_calls_in_half_open: 1,
        }
    }
}

/// A named breaker created at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakerConfig {
    /// Breaker identifier.
    pub name: String,

    #[serde(flatten)]
    pub settings: BreakerSettings,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Administrative API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the override routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.time_limiter.timeout(), Duration::from_secs(3));
        assert_eq!(config.upstream.fallback, "FALLBACK");
        assert_eq!(config.circuit_breakers.len(), 1);

        let settings = config.circuit_breakers[0].settings;
        assert_eq!(settings.failure_rate_threshold, 50);
        assert_eq!(settings.wait_duration_in_open(), Duration::from_millis(1000));
        assert_eq!(settings.sliding_window_size, 2);
        assert_eq!(settings.permitted_calls_in_half_open, 1);
    }

    #[test]
    fn test_partial_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [time_limiter]
            timeout_ms = 250

            [[circuit_breakers]]
            name = "inventory"
            sliding_window_size = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.time_limiter.timeout_ms, 250);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.circuit_breakers.len(), 1);

        let breaker = &config.circuit_breakers[0];
        assert_eq!(breaker.name, "inventory");
        assert_eq!(breaker.settings.sliding_window_size, 10);
        assert_eq!(breaker.settings.failure_rate_threshold, 50);
    }
}
