use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::resilience::circuit_breaker::CircuitState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub breakers: usize,
}

/// Body of a state override.
#[derive(Debug, Deserialize)]
pub struct ForceStateRequest {
    pub state: CircuitState,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        breakers: state.registry.len(),
    })
}

/// Force a breaker into the requested state.
pub async fn force_state(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<ForceStateRequest>,
) -> impl IntoResponse {
    if !state.registry.transition(&name, body.state) {
        return (StatusCode::NOT_FOUND, "Circuit breaker not found").into_response();
    }

    match state.registry.get(&name) {
        Some(cb) => (StatusCode::OK, Json(cb.snapshot())).into_response(),
        None => (StatusCode::NOT_FOUND, "Circuit breaker not found").into_response(),
    }
}
