//! Strategic Navigator compliance service binary.
//!
//! # Configuration
//!
//! - `NAVIGATOR_ARTIFACT_DIR` - directory with `target.json` and
//!   `compliance_data.csv` (default: `./artifacts`)
//! - `NAVIGATOR_*` engine settings (formula, margin, fallback target)
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `RUST_LOG`, `LOG_FORMAT`, `METRICS_ENABLED`

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};

use navigator_lib::{EmissionFactorPredictor, EngineConfig};
use navigator_service_compliance::app;
use navigator_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::from_env().with_service("compliance"));

    if let Err(e) = init_metrics(&MetricsConfig::from_env()) {
        tracing::warn!(error = %e, "metrics disabled, continuing without metrics");
    }

    let artifact_dir =
        env::var("NAVIGATOR_ARTIFACT_DIR").unwrap_or_else(|_| "./artifacts".to_string());
    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let config = EngineConfig::from_env()?;

    info!(artifact_dir = %artifact_dir, port, formula = %config.formula, "starting compliance service");

    let state = AppState::load(
        &artifact_dir,
        config,
        Arc::new(EmissionFactorPredictor::new()),
    )
    .map_err(|e| {
        error!(error = %e, dir = %artifact_dir, "failed to load application state");
        e
    })?;

    let snapshot = state.snapshot();
    info!(
        target = snapshot.target.target,
        source = ?snapshot.source,
        fleet_vessels = snapshot.fleet.as_ref().map(|rows| rows.len()),
        "application state loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
