// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kiroq status` / `kiroq messages` / `kiroq respond` commands.
//!
//! Thin HTTP client against a running gateway, for Amazon Q to read and
//! answer messages from a shell. Falls back gracefully when no bridge is
//! serving.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use kiroq_config::model::KiroqConfig;
use kiroq_core::BridgeError;

/// Client-side request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// GET /api/status body, as read back from the gateway.
#[derive(Debug, Deserialize)]
struct StatusBody {
    version: String,
    pending_messages: usize,
    total_messages: usize,
    message_file: String,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub running: bool,
    pub version: Option<String>,
    pub pending_messages: Option<usize>,
    pub total_messages: Option<usize>,
    pub message_file: Option<String>,
    pub gateway_host: String,
    pub gateway_port: u16,
}

fn base_url(config: &KiroqConfig) -> String {
    format!("http://{}:{}", config.gateway.host, config.gateway.port)
}

fn http_client() -> Result<reqwest::Client, BridgeError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| BridgeError::Internal(format!("failed to create HTTP client: {e}")))
}

/// Run the `kiroq status` command.
pub async fn run_status(config: &KiroqConfig, json: bool) -> Result<(), BridgeError> {
    let url = format!("{}/api/status", base_url(config));
    let client = http_client()?;

    let body = match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => resp.json::<StatusBody>().await.ok(),
        _ => None,
    };

    let report = match body {
        Some(status) => StatusReport {
            running: true,
            version: Some(status.version),
            pending_messages: Some(status.pending_messages),
            total_messages: Some(status.total_messages),
            message_file: Some(status.message_file),
            gateway_host: config.gateway.host.clone(),
            gateway_port: config.gateway.port,
        },
        None => StatusReport {
            running: false,
            version: None,
            pending_messages: None,
            total_messages: None,
            message_file: None,
            gateway_host: config.gateway.host.clone(),
            gateway_port: config.gateway.port,
        },
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    println!();
    println!("  kiroq status");
    println!("  {}", "-".repeat(35));
    if report.running {
        println!(
            "    State:    [OK] active (v{})",
            report.version.as_deref().unwrap_or("?")
        );
        println!(
            "    Messages: {} total, {} pending",
            report.total_messages.unwrap_or(0),
            report.pending_messages.unwrap_or(0)
        );
        println!(
            "    Store:    {}",
            report.message_file.as_deref().unwrap_or("?")
        );
    } else {
        println!("    State:    [FAIL] not running");
        println!("    Endpoint: {url}");
        println!();
        println!("  Start with: kiroq serve");
    }
    println!();
    Ok(())
}

/// Run the `kiroq messages` command: print the pending list as JSON.
pub async fn run_messages(config: &KiroqConfig) -> Result<(), BridgeError> {
    let url = format!("{}/api/messages", base_url(config));
    let client = http_client()?;
    let resp = client.get(&url).send().await.map_err(offline)?;
    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| BridgeError::Internal(format!("invalid response body: {e}")))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&body).unwrap_or_else(|_| "{}".to_string())
    );
    Ok(())
}

/// Run the `kiroq respond` command: POST an Amazon Q answer.
pub async fn run_respond(
    config: &KiroqConfig,
    message: &str,
    reply_to: Option<&str>,
    priority: Option<&str>,
) -> Result<(), BridgeError> {
    let url = format!("{}/api/respond", base_url(config));
    let client = http_client()?;

    let mut payload = serde_json::json!({ "message": message });
    if let Some(parent) = reply_to {
        payload["reply_to"] = serde_json::Value::String(parent.to_string());
    }
    if let Some(p) = priority {
        payload["priority"] = serde_json::Value::String(p.to_string());
    }

    let resp = client
        .post(&url)
        .json(&payload)
        .send()
        .await
        .map_err(offline)?;
    let status = resp.status();
    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| BridgeError::Internal(format!("invalid response body: {e}")))?;

    if !status.is_success() {
        let error = body["error"].as_str().unwrap_or("request rejected");
        return Err(BridgeError::Validation(error.to_string()));
    }
    println!(
        "Response sent: {}",
        body["message_id"].as_str().unwrap_or("?")
    );
    Ok(())
}

fn offline(err: reqwest::Error) -> BridgeError {
    BridgeError::Gateway {
        message: format!("bridge not reachable (is `kiroq serve` running?): {err}"),
        source: Some(Box::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_report_serializes_running() {
        let report = StatusReport {
            running: true,
            version: Some("0.4.0".to_string()),
            pending_messages: Some(2),
            total_messages: Some(10),
            message_file: Some(".kiro-q-messages.json".to_string()),
            gateway_host: "127.0.0.1".to_string(),
            gateway_port: 3847,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"running\":true"));
        assert!(json.contains("\"pending_messages\":2"));
    }

    #[test]
    fn status_report_serializes_offline() {
        let report = StatusReport {
            running: false,
            version: None,
            pending_messages: None,
            total_messages: None,
            message_file: None,
            gateway_host: "127.0.0.1".to_string(),
            gateway_port: 3847,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"running\":false"));
    }

    #[test]
    fn base_url_uses_gateway_section() {
        let config = KiroqConfig::default();
        assert_eq!(base_url(&config), "http://127.0.0.1:3847");
    }
}
