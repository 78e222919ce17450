//! Server startup: warehouse client construction, listener binding, shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::gateway::WarehouseHandle;
use crate::router::build_router;
use crate::state::AppState;

/// Build `AppState`. Never fails: a client that cannot be built is recorded
/// as unavailable and surfaces on each query request.
pub async fn build_app_state(config: &Config) -> Arc<AppState> {
    let warehouse = WarehouseHandle::connect(config.warehouse.clone()).await;
    if !warehouse.is_ready() {
        tracing::warn!("Starting without a warehouse client; POST / will answer 500");
    }
    AppState::new(warehouse)
}

/// Bind, serve until SIGINT or SIGTERM, then drain in-flight requests.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = build_app_state(config).await;
    let app = build_router(state);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("querygate exited cleanly");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }

    info!("Shutdown signal received, draining connections");
}
