//! Resilience gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                 RESILIENCE GATEWAY               │
//!   GET /api/greek     │  ┌────────┐   ┌─────────────────┐   ┌─────────┐  │
//!   ───────────────────┼─▶│  http  │──▶│ ProtectedInvoker│──▶│upstream │──┼──▶ Upstream
//!                      │  │ server │   │ breaker + limit │   │ fetcher │  │    (JSON array)
//!   ◀──── value ───────┼──│        │◀──│  or fallback    │◀──│         │◀─┼───
//!                      │  └────────┘   └───────┬─────────┘   └─────────┘  │
//!                      │       │               │                          │
//!   GET /actuator/*    │       ▼               ▼                          │
//!   POST /admin/*      │  ┌──────────────────────────┐                    │
//!   ───────────────────┼─▶│ BreakerRegistry (per id) │                    │
//!                      │  └──────────────────────────┘                    │
//!                      └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use resilience_gateway::config::{load_config, GatewayConfig};
use resilience_gateway::lifecycle::{signals, Shutdown};
use resilience_gateway::observability::{logging, metrics};
use resilience_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "resilience-gateway")]
#[command(about = "Circuit-breaking gateway in front of an unreliable HTTP upstream", long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("resilience-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        breaker = %config.upstream.breaker,
        call_timeout_ms = config.time_limiter.timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::forward_to(&shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
