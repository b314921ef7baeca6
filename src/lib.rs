pub mod api;
pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{RateCache, Refresher, StartupGate};
use crate::providers::ExchangeRateApiProvider;
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Serve { port: Option<u16> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let mut config = AppConfig::load(config_path)?;
    debug!(
        base = %config.base_currency,
        interval = config.update_interval_seconds,
        frontend_dir = %config.frontend_dir.display(),
        "Loaded config"
    );

    match command {
        AppCommand::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            run(config).await
        }
    }
}

pub async fn run(config: AppConfig) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    serve(listener, &config, shutdown_signal()).await
}

/// Builds the startup gate around the configured upstream provider. Nothing is fetched
/// until the first request passes through it.
pub fn build_gate(config: &AppConfig) -> Result<Arc<StartupGate>> {
    if config.api_key.is_empty() {
        warn!("No exchange rate API key configured, upstream requests will be rejected");
    }

    let provider = ExchangeRateApiProvider::from_config(config)?;
    let refresher = Refresher::new(Arc::new(provider), RateCache::new(), config.update_interval());
    Ok(Arc::new(StartupGate::new(refresher)))
}

/// Serves on `listener` until `shutdown` completes, then stops the background refresher.
pub async fn serve<F>(listener: TcpListener, config: &AppConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let gate = build_gate(config)?;
    let app = api::router(api::AppState::new(Arc::clone(&gate)), &config.frontend_dir);

    info!(
        address = %listener.local_addr()?,
        base = %config.base_currency,
        interval = ?config.update_interval(),
        "Exchange rate service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    gate.shutdown().await;
    info!("Exchange rate service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
