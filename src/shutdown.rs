use std::sync::Arc;

use tokio::signal;

use crate::server::AppState;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

/// Perform graceful shutdown: let accepted runs finish within the grace
/// period, then remove the workspaces they left behind.
pub async fn graceful_shutdown(state: &Arc<AppState>) {
    tracing::info!("Starting graceful shutdown...");

    let grace = state.config.server.shutdown_grace();
    let in_flight = state.runs.in_flight().await;
    if in_flight > 0 {
        tracing::info!(in_flight, grace = ?grace, "Waiting for in-flight runs");
    }
    let aborted = state.runs.drain(grace).await;
    if aborted > 0 {
        tracing::warn!(aborted, "Aborted runs still in flight at the shutdown deadline");
    }

    let workspaces = &state.release.workspaces;
    if workspaces.keep_on_failure() {
        tracing::info!("Keeping leftover workspaces for inspection");
        return;
    }

    let removed = workspaces.sweep().await;
    tracing::info!(removed, "Graceful shutdown complete");
}
