// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, CORS, and shared state, with graceful shutdown through
//! a cancellation token.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use kiroq_core::{BridgeError, MessageLog};

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The message log every request reloads fresh.
    pub store: Arc<dyn MessageLog>,
    /// Display path of the backing file, reported by /api/status.
    pub message_file: String,
}

/// Gateway server configuration (mirrors GatewaySection from kiroq-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the bridge API router.
///
/// Routes:
/// - GET /api/messages
/// - POST /api/respond
/// - GET /api/status
/// - everything else: 404 with an error body
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/messages", get(handlers::get_messages))
        .route("/api/respond", post(handlers::post_respond))
        .route("/api/status", get(handlers::get_status))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server and serve until cancellation.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), BridgeError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BridgeError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| BridgeError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiroq_config::model::StoreSection;
    use kiroq_store::FileMessageStore;
    use tempfile::TempDir;

    #[test]
    fn gateway_state_is_clone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".kiro-q-messages.json");
        let state = GatewayState {
            store: Arc::new(FileMessageStore::new(&StoreSection {
                message_file: path.clone(),
                legacy_file: None,
                max_messages: 100,
            })),
            message_file: path.display().to_string(),
        };
        let _cloned = state.clone();
    }

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3847,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("3847"));
    }
}
