// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kiroq serve` and `kiroq mcp` command implementations.
//!
//! `serve` runs both front ends over one shared store: the HTTP gateway for
//! Amazon Q and the stdio tool-call server for Kiro. `mcp` runs only the
//! stdio server, for use as a spawned subprocess. Logs go to stderr; stdout
//! belongs to the tool-call protocol.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use kiroq_config::model::{AskSection, KiroqConfig};
use kiroq_core::BridgeError;
use kiroq_engine::AskConfig;
use kiroq_gateway::{GatewayState, ServerConfig};
use kiroq_mcp::ToolServer;
use kiroq_store::FileMessageStore;

use crate::shutdown;

/// Translate the ask section into engine timing.
pub fn ask_config(section: &AskSection) -> AskConfig {
    AskConfig {
        poll_interval: Duration::from_secs(section.poll_interval_secs),
        max_wait: Duration::from_secs(section.max_wait_secs),
        reply_window: Duration::from_secs(section.reply_window_secs),
    }
}

/// Run both front ends until a shutdown signal or stdin EOF.
pub async fn run_serve(config: &KiroqConfig) -> Result<(), BridgeError> {
    let cancel = shutdown::install_signal_handler();
    let store = Arc::new(FileMessageStore::new(&config.store));
    let state = GatewayState {
        store: store.clone(),
        message_file: store.message_file().display().to_string(),
    };
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let tools = ToolServer::new(store, ask_config(&config.ask));

    let gateway_cancel = cancel.clone();
    let gateway = tokio::spawn(async move {
        kiroq_gateway::start_server(&server_config, state, gateway_cancel).await
    });

    info!("bridge serving: http on port {}, tools on stdio", config.gateway.port);
    let stdio_result = kiroq_mcp::run_stdio(tools, cancel.clone()).await;

    // Whichever side finishes first takes the other one down with it.
    cancel.cancel();
    match gateway.await {
        Ok(result) => result?,
        Err(e) => return Err(BridgeError::Internal(format!("gateway task failed: {e}"))),
    }
    stdio_result
}

/// Run only the stdio tool-call server.
pub async fn run_mcp(config: &KiroqConfig) -> Result<(), BridgeError> {
    let cancel = shutdown::install_signal_handler();
    let store = Arc::new(FileMessageStore::new(&config.store));
    let tools = ToolServer::new(store, ask_config(&config.ask));
    kiroq_mcp::run_stdio(tools, cancel).await
}

/// Initializes the tracing subscriber with the given log level.
///
/// Writes to stderr so the stdio protocol on stdout stays clean.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kiroq={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
