// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stdio transport: newline-delimited JSON in, newline-delimited JSON out.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use kiroq_core::BridgeError;

use crate::protocol::{Request, Response, PARSE_ERROR};
use crate::tools::ToolServer;

/// Serve tool calls over stdin/stdout until EOF or cancellation.
///
/// Malformed lines produce a `-32700` response on stdout; they never stop
/// the loop. Blank lines are skipped.
pub async fn run_stdio(server: ToolServer, cancel: CancellationToken) -> Result<(), BridgeError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();
    info!("tool-call server listening on stdio");

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => {
                info!("tool-call server shutting down");
                return Ok(());
            }
            line = lines.next_line() => line.map_err(BridgeError::storage)?,
        };
        let Some(line) = line else {
            info!("stdin closed, tool-call server exiting");
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => server.handle_request(request, &cancel).await,
            Err(err) => {
                warn!(%err, "unparseable request line");
                Response::err(Value::Null, PARSE_ERROR, format!("Parse error: {err}"))
            }
        };
        let mut payload =
            serde_json::to_vec(&response).map_err(|e| BridgeError::Internal(e.to_string()))?;
        payload.push(b'\n');
        stdout
            .write_all(&payload)
            .await
            .map_err(BridgeError::storage)?;
        stdout.flush().await.map_err(BridgeError::storage)?;
    }
}
