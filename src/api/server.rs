//! Status API server lifecycle.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. The serving layer polls this server; the pipeline jobs never
//! touch it.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::router::status_api_router;
use crate::api::types::ApiContext;

/// Handle to a running status API server.
pub struct StatusServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl StatusServer {
    /// Shut down the server gracefully. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Status server shutdown signal sent");
        }
    }
}

/// Start the status API server.
///
/// Binds `bind` (port 0 picks an ephemeral port, used by tests), mounts
/// the router, and spawns the server in a background tokio task.
pub async fn start_status_server(
    ctx: ApiContext,
    bind: SocketAddr,
) -> Result<StatusServer, String> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| format!("Failed to bind status server on {bind}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = status_api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Status server received shutdown signal");
        };

        tracing::info!(%addr, "Status server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Status server error: {e}");
        }

        tracing::info!("Status server stopped");
    });

    Ok(StatusServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
