//! End-to-end breaker behaviour against a mock upstream.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use resilience_gateway::config::{BreakerSettings, GatewayConfig};
use resilience_gateway::http::AppState;
use resilience_gateway::resilience::TimeLimiter;
use resilience_gateway::{BreakerRegistry, CircuitState, ProtectedInvoker};

mod common;

use common::{MockResponse, GODS};

const BREAKER: &str = "greek-gods";
const FALLBACK: &str = "FALLBACK";

fn state_for(url: &str, timeout_ms: u64) -> AppState {
    let mut config = GatewayConfig::default();
    config.upstream.url = url.to_string();
    config.time_limiter.timeout_ms = timeout_ms;
    AppState::from_config(&config).unwrap()
}

fn breaker_state(state: &AppState) -> CircuitState {
    state.registry.get(BREAKER).unwrap().state()
}

/// Upstream cycling ok, ok, error; counts every hit.
async fn cycling_backend(hits: Arc<AtomicU32>) -> String {
    let addr = common::start_programmable_backend(move || {
        let hits = hits.clone();
        async move {
            let n = hits.fetch_add(1, Ordering::SeqCst);
            if n % 3 == 2 {
                MockResponse::status(500)
            } else {
                MockResponse::json(GODS)
            }
        }
    })
    .await;
    common::greek_url(addr)
}

async fn counting_backend(hits: Arc<AtomicU32>, response: MockResponse) -> String {
    let addr = common::start_programmable_backend(move || {
        let hits = hits.clone();
        let response = response.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            response
        }
    })
    .await;
    common::greek_url(addr)
}

#[tokio::test]
async fn test_closed_state_returns_real_value() {
    let hits = Arc::new(AtomicU32::new(0));
    let url = counting_backend(hits.clone(), MockResponse::json(GODS)).await;
    let state = state_for(&url, 3000);

    assert_eq!(breaker_state(&state), CircuitState::Closed);
    assert_eq!(state.service.retrieve(&url).await, "Zeus");
    assert_eq!(state.service.retrieve(&url).await, "Zeus");
    assert_eq!(breaker_state(&state), CircuitState::Closed);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failure_after_two_successes_opens_circuit() {
    let hits = Arc::new(AtomicU32::new(0));
    let url = cycling_backend(hits.clone()).await;
    let state = state_for(&url, 3000);

    assert_eq!(state.service.retrieve(&url).await, "Zeus");
    assert_eq!(state.service.retrieve(&url).await, "Zeus");
    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(breaker_state(&state), CircuitState::Open);

    // Rejected without contacting the upstream
    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    let snapshot = state.registry.get(BREAKER).unwrap().snapshot();
    assert_eq!(snapshot.not_permitted_calls, 1);
    assert_eq!(snapshot.failure_rate, 50);
}

#[tokio::test]
async fn test_forced_open_makes_no_outbound_call() {
    let hits = Arc::new(AtomicU32::new(0));
    let url = counting_backend(hits.clone(), MockResponse::json(GODS)).await;
    let state = state_for(&url, 3000);

    assert!(state.registry.transition(BREAKER, CircuitState::Open));
    assert_eq!(breaker_state(&state), CircuitState::Open);

    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(breaker_state(&state), CircuitState::Open);
}

#[tokio::test]
async fn test_slow_upstream_times_out_and_trips() {
    let hits = Arc::new(AtomicU32::new(0));
    let slow = MockResponse::json(GODS).delayed(Duration::from_millis(350));
    let url = counting_backend(hits.clone(), slow).await;
    let state = state_for(&url, 200);

    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(breaker_state(&state), CircuitState::Closed);

    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(breaker_state(&state), CircuitState::Open);

    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

/// Default 3s call timeout against a 3.5s upstream, on a paused clock.
#[tokio::test(start_paused = true)]
async fn test_default_call_timeout_trips_breaker() {
    let config = GatewayConfig::default();
    let registry = Arc::new(BreakerRegistry::from_config(&config).unwrap());
    let invoker = ProtectedInvoker::new(registry.clone(), TimeLimiter::new(config.time_limiter.timeout()));

    let hits = AtomicU32::new(0);
    let slow_upstream = || async {
        hits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(3500)).await;
        Ok::<_, std::io::Error>("Zeus".to_string())
    };

    let value = invoker.invoke(BREAKER, slow_upstream(), FALLBACK.to_string()).await;
    assert_eq!(value, FALLBACK);
    assert_eq!(registry.get(BREAKER).unwrap().state(), CircuitState::Closed);

    let value = invoker.invoke(BREAKER, slow_upstream(), FALLBACK.to_string()).await;
    assert_eq!(value, FALLBACK);
    assert_eq!(registry.get(BREAKER).unwrap().state(), CircuitState::Open);

    let value = invoker.invoke(BREAKER, slow_upstream(), FALLBACK.to_string()).await;
    assert_eq!(value, FALLBACK);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_recovers_after_wait_duration() {
    let healthy = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = healthy.clone();
    let addr = common::start_programmable_backend(move || {
        let flag = flag.clone();
        async move {
            if flag.load(Ordering::SeqCst) {
                MockResponse::json(GODS)
            } else {
                MockResponse::status(503)
            }
        }
    })
    .await;
    let url = common::greek_url(addr);

    let mut config = GatewayConfig::default();
    config.upstream.url = url.clone();
    config.circuit_breakers[0].settings = BreakerSettings {
        wait_duration_in_open_ms: 100,
        ..Default::default()
    };
    let state = AppState::from_config(&config).unwrap();

    state.service.retrieve(&url).await;
    state.service.retrieve(&url).await;
    assert_eq!(breaker_state(&state), CircuitState::Open);

    healthy.store(true, Ordering::SeqCst);
    assert_eq!(state.service.retrieve(&url).await, FALLBACK);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(state.service.retrieve(&url).await, "Zeus");
    assert_eq!(breaker_state(&state), CircuitState::Closed);
    assert_eq!(state.registry.get(BREAKER).unwrap().snapshot().buffered_calls, 0);
}

#[tokio::test]
async fn test_malformed_payload_counts_as_failure() {
    let url = common::greek_url(common::start_mock_backend(MockResponse::json(r#"{"god":"Zeus"}"#)).await);
    let state = state_for(&url, 3000);

    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(state.registry.get(BREAKER).unwrap().snapshot().failed_calls, 1);
}

#[tokio::test]
async fn test_empty_array_yields_fallback_without_failure() {
    let url = common::greek_url(common::start_mock_backend(MockResponse::json("[]")).await);
    let state = state_for(&url, 3000);

    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    let snapshot = state.registry.get(BREAKER).unwrap().snapshot();
    assert_eq!(snapshot.buffered_calls, 1);
    assert_eq!(snapshot.failed_calls, 0);
}

#[tokio::test]
async fn test_empty_body_yields_empty_value() {
    let url = common::greek_url(common::start_mock_backend(MockResponse::json("")).await);
    let state = state_for(&url, 3000);

    assert_eq!(state.service.retrieve(&url).await, "");
}

#[tokio::test]
async fn test_unreachable_upstream_returns_fallback() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = common::greek_url(addr);
    let state = state_for(&url, 3000);

    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(state.service.retrieve(&url).await, FALLBACK);
    assert_eq!(breaker_state(&state), CircuitState::Open);
}
