//! Listener lifecycle.

use crate::{AppState, create_router};
use keepsake_error::{ServerError, ServerErrorKind};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Bind `address` and serve until `shutdown` resolves.
pub async fn serve<F>(address: &str, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(address).await.map_err(|e| {
        ServerError::new(ServerErrorKind::Bind {
            address: address.to_string(),
            reason: e.to_string(),
        })
    })?;
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| address.to_string());
    info!(address = %local, "Download proxy listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::new(ServerErrorKind::Serve(e.to_string())))?;

    info!("Download proxy stopped");
    Ok(())
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
