//! Read-only diagnostics endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::http::server::AppState;
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitState};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub components: HealthComponents,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthComponents {
    pub circuit_breakers: BreakersHealth,
}

#[derive(Debug, Serialize)]
pub struct BreakersHealth {
    pub status: &'static str,
    pub details: BTreeMap<String, BreakerHealth>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerHealth {
    pub status: &'static str,
    pub state: CircuitState,
    pub failure_rate: u8,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    pub not_permitted_calls: u64,
}

impl From<BreakerSnapshot> for BreakerHealth {
    fn from(s: BreakerSnapshot) -> Self {
        let status = match s.state {
            CircuitState::Closed => "UP",
            CircuitState::Open => "CIRCUIT_OPEN",
            CircuitState::HalfOpen => "CIRCUIT_HALF_OPEN",
        };
        Self {
            status,
            state: s.state,
            failure_rate: s.failure_rate,
            buffered_calls: s.buffered_calls,
            failed_calls: s.failed_calls,
            not_permitted_calls: s.not_permitted_calls,
        }
    }
}

/// `GET /` sends operators to the actuator.
pub async fn redirect_root() -> Redirect {
    Redirect::permanent("/actuator")
}

pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "_links": {
            "self": { "href": "/actuator" },
            "health": { "href": "/actuator/health" },
            "circuitbreakers": { "href": "/actuator/circuitbreakers" },
            "circuitbreaker": { "href": "/actuator/circuitbreakers/{name}", "templated": true },
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let details = state
        .registry
        .snapshots()
        .into_iter()
        .map(|s| (s.name.clone(), BreakerHealth::from(s)))
        .collect();

    Json(HealthReport {
        status: "UP",
        components: HealthComponents {
            circuit_breakers: BreakersHealth { status: "UP", details },
        },
    })
}

pub async fn list_breakers(State(state): State<AppState>) -> Json<Vec<BreakerSnapshot>> {
    Json(state.registry.snapshots())
}

pub async fn get_breaker(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.registry.get(&name) {
        Some(cb) => (StatusCode::OK, Json(cb.snapshot())).into_response(),
        None => (StatusCode::NOT_FOUND, "Circuit breaker not found").into_response(),
    }
}
