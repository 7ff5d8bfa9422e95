mod api;
mod catalog;
mod config;
mod metrics_proxy;
mod summary;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use anyhow::{Context, Result};
use crate::catalog::HttpCatalog;
use crate::config::{Config, MetricsProxyHandle};
use crate::metrics_proxy::MetricsProxy;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ui_agentd=info,ui_metrics_proxy=info"))
        )
        .init();

    tracing::info!("Starting ui-agentd");

    // Load config
    let config_path = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "/etc/ui-agent/agentd.toml".to_string()),
    );

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    tracing::info!("Loaded config from {}", config_path.display());

    if !config.ui.enabled {
        tracing::info!("UI is disabled; metrics proxy requests will be rejected");
    }

    let metrics_proxy_config = config.metrics_proxy_handle();
    let catalog = HttpCatalog::new(&config.catalog)?;
    let metrics_proxy = MetricsProxy::new(config.ui.enabled, metrics_proxy_config.clone())?;

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Spawn config reload task
    let reload_cancel = cancel.clone();
    let reload_path = config_path.clone();
    let reload_handle = tokio::spawn(async move {
        if let Err(e) = run_reloader(reload_path, metrics_proxy_config, reload_cancel).await {
            tracing::error!("Config reloader error: {}", e);
        }
    });

    // Build API router
    let app_state = api::routes::AppState {
        catalog: Arc::new(catalog),
        agent: Arc::new(config.agent.clone()),
        dns: Arc::new(config.dns.clone()),
        metrics_proxy,
    };
    let app = api::routes::router(app_state);

    // Bind HTTP server
    let listener = tokio::net::TcpListener::bind(&config.api.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.api.listen))?;

    tracing::info!("API listening on {}", config.api.listen);

    // Run server with graceful shutdown; peer addresses feed X-Forwarded-For
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutdown signal received");

    // Trigger cancellation
    cancel.cancel();

    // Wait for all tasks to complete
    let _ = tokio::join!(reload_handle, server_handle);

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Re-read the metrics proxy section of the config file on every SIGHUP
async fn run_reloader(
    path: PathBuf,
    handle: MetricsProxyHandle,
    cancel: CancellationToken,
) -> Result<()> {
    let mut hangup = signal(SignalKind::hangup()).context("Failed to listen for SIGHUP")?;

    loop {
        tokio::select! {
            Some(()) = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading {}", path.display());
                if let Err(e) = config::reload_metrics_proxy(&path, &handle) {
                    tracing::error!("Failed to reload config, keeping previous metrics proxy settings: {:#}", e);
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("Config reloader shutting down");
                break;
            }
        }
    }

    Ok(())
}
