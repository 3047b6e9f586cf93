//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared state (breaker registry, protected service) from config
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ceiling, request ID)
//! - Serve until the shutdown broadcast fires

use axum::{
    extract::State,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::{AdminConfig, ConfigError, GatewayConfig};
use crate::http::actuator;
use crate::http::request::{RequestUuid, X_REQUEST_ID};
use crate::resilience::invoker::ProtectedInvoker;
use crate::resilience::registry::BreakerRegistry;
use crate::resilience::timeouts::TimeLimiter;
use crate::upstream::{ProtectedService, RemoteFetcher};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BreakerRegistry>,
    pub service: Arc<ProtectedService>,
    pub upstream_url: Arc<str>,
    pub admin: AdminConfig,
}

impl AppState {
    /// Build every shared component. Fails on invalid breaker settings.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(BreakerRegistry::from_config(config)?);
        let limiter = TimeLimiter::new(config.time_limiter.timeout());
        let invoker = Arc::new(ProtectedInvoker::new(registry.clone(), limiter));
        let service = ProtectedService::new(invoker, RemoteFetcher::default(), &config.upstream);

        Ok(Self {
            registry,
            service: Arc::new(service),
            upstream_url: Arc::from(config.upstream.url.as_str()),
            admin: config.admin.clone(),
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let state = AppState::from_config(config)?;
        let router = Self::build_router(config, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(actuator::redirect_root))
            .route("/actuator", get(actuator::index))
            .route("/actuator/health", get(actuator::health))
            .route("/actuator/circuitbreakers", get(actuator::list_breakers))
            .route("/actuator/circuitbreakers/{name}", get(actuator::get_breaker))
            .route("/api/greek", get(retrieve_handler))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, RequestUuid))
    }

    /// Shared state, e.g. to inspect breakers from tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The fully layered router.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            breakers = self.state.registry.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `GET /api/greek`: the protected upstream value, or the fallback.
async fn retrieve_handler(State(state): State<AppState>) -> String {
    state.service.retrieve(&state.upstream_url).await
}
