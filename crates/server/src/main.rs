//! HealthTrack server binary
//!
//! Reads `healthtrack.toml` from the working directory (optional) and the
//! environment (`DATABASE_URI`, `PORT`, `HEALTHTRACK_ENV`,
//! `HEALTHTRACK_TLS_CERT`), opens the store and serves the API.

use anyhow::{Context, Result};
use healthtrack_engine::{Database, HealthTrackConfig};
use healthtrack_server::{router, AppState};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HealthTrackConfig::load(Path::new(".")).context("invalid configuration")?;
    let db = Database::open(&config).context("failed to open database")?;
    let app = router(AppState::new(Arc::new(db), config.is_development()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    info!(target: "healthtrack::http", %addr, environment = %config.environment, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!(target: "healthtrack::http", "Shutting down");
}
