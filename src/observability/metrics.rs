//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_breaker_calls_total` (counter): calls by breaker, outcome
//!   (success, failure, timeout, rejected)
//! - `gateway_breaker_call_duration_seconds` (histogram): permitted call latency
//! - `gateway_breaker_state` (gauge): 0=closed, 1=open, 2=half_open
//! - `gateway_breaker_transitions_total` (counter): transitions by breaker, target state
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a permitted call and how it ended.
pub fn record_call(breaker: &str, outcome: &'static str, start: Instant) {
    counter!("gateway_breaker_calls_total", "breaker" => breaker.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("gateway_breaker_call_duration_seconds", "breaker" => breaker.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a call the breaker did not permit.
pub fn record_rejected(breaker: &str) {
    counter!("gateway_breaker_calls_total", "breaker" => breaker.to_string(), "outcome" => "rejected")
        .increment(1);
}

/// Record a state transition.
pub fn record_transition(breaker: &str, to: CircuitState) {
    counter!("gateway_breaker_transitions_total", "breaker" => breaker.to_string(), "to" => to.as_str())
        .increment(1);
    record_breaker_state(breaker, to);
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    };
    gauge!("gateway_breaker_state", "breaker" => breaker.to_string()).set(value);
}
