//! HTTP server lifecycle.
//!
//! [`start_server`] binds the configured address and serves the router
//! until the shutdown [`StopSignal`] fires.

use std::net::SocketAddr;
use std::sync::Arc;

use lifestream_core::config::ServerSettings;
use lifestream_core::StopSignal;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Serve HTTP and `WebSocket` requests until `shutdown` fires.
///
/// Upgraded connections are not tracked by the HTTP server; close them
/// through [`SubscriptionHub::close_all`](crate::SubscriptionHub::close_all).
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or cannot be
/// bound, and [`ServerError::Serve`] on a fatal I/O error while serving.
pub async fn start_server(
    settings: &ServerSettings,
    state: Arc<AppState>,
    shutdown: StopSignal,
) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Lifestream server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.stopped().await })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Lifestream server stopped");
    Ok(())
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
