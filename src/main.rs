//! Client-IP-injecting forwarding proxy.
//!
//! A transparent reverse proxy that forwards all traffic to a single
//! fixed upstream, injecting the `X-MGM-Client-IP` header with the
//! real client address resolved from CDN/LB trust headers.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌───────────────────────────────────────────┐
//!                  │              FORWARDING PROXY             │
//!                  │                                           │
//!  Client Request  │  ┌────────┐   ┌──────────┐   ┌─────────┐  │
//!  ────────────────┼─▶│  http  │──▶│ resolver │──▶│  http   │──┼──▶ Upstream
//!                  │  │ server │   │(client IP)│  │ client  │  │
//!                  │  └────────┘   └──────────┘   └────┬────┘  │
//!                  │       ▲                           │       │
//!  Client Response │       └───── verbatim relay ──────┘       │
//!  ◀───────────────┼                                           │
//!                  │  ┌─────────────────────────────────────┐  │
//!                  │  │  config (env)   tracing   shutdown  │  │
//!                  │  └─────────────────────────────────────┘  │
//!                  └───────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mgm_proxy::config;
use mgm_proxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mgm_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("mgm-proxy v0.1.0 starting");

    // Load configuration; a bad upstream URL or port is fatal.
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        bind_address = %config.bind_address,
        upstream = %config.upstream_base,
        upstream_timeout_secs = config.upstream_timeout.as_secs(),
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Create and run HTTP server
    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
