//! Binding the listener and serving a router.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::metrics_router;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::utils::shutdown_signal;

/// Bind the listener. Failure here is fatal for the caller.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|source| {
        error!("Failed to bind {}: {}", addr, source);
        AppError::Bind { addr, source }
    })
}

/// Attach `/metrics` when enabled in `config`.
pub fn with_metrics(router: Router, config: &Config) -> Result<Router> {
    if !config.metrics_enabled {
        return Ok(router);
    }

    let handle = metrics::install_recorder()?;
    info!("Metrics enabled on /metrics");
    Ok(router.merge(metrics_router(handle)))
}

/// Serve `router` on `listener` until SIGINT/SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Bind to the configured address and serve.
pub async fn run(config: &Config, router: Router) -> Result<()> {
    let router = with_metrics(router, config)?;
    let listener = bind(config.bind_addr()).await?;
    serve(listener, router).await
}
