//! Transport service - binds the listener and serves the SSE router.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use super::config::SseConfig;
use super::error::{TransportError, TransportResult};
use super::sse;
use crate::core::McpServer;
use crate::core::session::SessionManager;

/// Transport service - owns the network side of the MCP server.
pub struct TransportService {
    config: SseConfig,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: SseConfig) -> Self {
        Self { config }
    }

    /// Log information about the configured transport.
    pub fn log_info(&self) {
        info!("Starting transport: {}", self.config.description());
    }

    /// Bind and serve until Ctrl+C.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        self.log_info();

        let addr = self.config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        serve(listener, &self.config, server, shutdown_signal()).await
    }
}

/// Serve the SSE router on an already-bound listener until `shutdown`
/// resolves. Every session is closed before the server stops.
pub async fn serve<F>(
    listener: TcpListener,
    config: &SseConfig,
    server: McpServer,
    shutdown: F,
) -> TransportResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sessions = Arc::new(SessionManager::new(server));
    let app = sse::router(Arc::clone(&sessions), config);

    let local = listener.local_addr()?;
    let cors_status = if config.enable_cors {
        "enabled"
    } else {
        "disabled"
    };
    info!("Ready - listening on {} (MCP over SSE, CORS {})", local, cors_status);
    info!("  → Events:   GET {}", config.sse_path);
    info!("  → Messages: POST {}?session_id=<id>", config.message_path);
    info!("  → Health:   GET /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown requested, closing sessions");
            // Ending the event streams lets the open connections finish.
            sessions.shutdown().await;
        })
        .await
        .map_err(|e| TransportError::http(e.to_string()))?;

    info!("Transport stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
