//! DF Gateway HTTP Server Binary
//!
//! Loads configuration, builds the repositories, sets up the HTTP router and
//! serves requests until Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! # Run with the in-memory repository (default)
//! cargo run --bin df-server
//!
//! # Run against InfluxDB and MongoDB
//! REPOSITORY_TYPE=remote INFLUX_TOKEN=... \
//!   cargo run --bin df-server --features remote-repo
//! ```
//!
//! # Environment Variables
//!
//! - `GATEWAY_CONFIG`: Path to a `gateway.toml` (default: searched in `.`, `backend/`, `..`)
//! - `REPOSITORY_TYPE`: `local` or `remote`
//! - `INFLUX_*`, `MONGO_*`: store settings, see `db::config`
//! - `HOST` / `PORT`: bind address (default: 0.0.0.0:3000)
//! - `BODY_LIMIT_BYTES`: largest accepted request body (default: 16 MiB)
//! - `RUST_LOG`: log filter (default: info)

use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use df_gateway::db::{GatewayConfig, RepositoryFactory};
use df_gateway::http::{create_router_with_limit, AppState, API_VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!(version = API_VERSION, "Starting DF gateway");

    let config = GatewayConfig::load().context("failed to load gateway configuration")?;
    info!(repository = %config.repository.repo_type, "Configuration loaded");

    let repos = RepositoryFactory::create(&config)
        .await
        .context("failed to initialize repositories")?;
    info!("Repositories initialized successfully");

    let state = AppState::new(repos, &config.influx);
    let app = create_router_with_limit(state, config.server.body_limit_bytes);

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind_address()))?;

    info!("Server listening on http://{}/{}/api", addr, API_VERSION);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
