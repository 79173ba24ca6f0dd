//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::auth::TokenVerifier;
use crate::hub::Hub;

use super::{
    handler::{
        http::{get_presence, health_check, push_notification},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router. Exposed separately from [`Server::run`] so
/// integration tests can serve it on an ephemeral port.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket endpoint
        .route("/ws", get(websocket_handler))
        // HTTP endpoints
        .route("/api/health", get(health_check))
        .route("/api/presence", get(get_presence))
        .route("/api/notifications", post(push_notification))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Realtime gateway server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(hub, verifier);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    hub: Arc<Hub>,
    verifier: TokenVerifier,
}

impl Server {
    pub fn new(hub: Arc<Hub>, verifier: TokenVerifier) -> Self {
        Self { hub, verifier }
    }

    /// Run the gateway server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let state = Arc::new(AppState {
            hub: self.hub.clone(),
            verifier: self.verifier,
            notifier: self.hub,
        });
        let app = app(state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Realtime gateway listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?token=<jwt>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
