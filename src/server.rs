use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::observability::shutdown_observability;

/// Bind the configured address and serve `app` until CTRL+C
pub async fn serve(app: Router, server: &ServerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::new(server.host.parse()?, server.port);
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for CTRL+C");
    }
    info!("Shutdown signal received");
    shutdown_observability().await;
}
