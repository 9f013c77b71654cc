// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the bridge API.
//!
//! Handles GET /api/messages, POST /api/respond, GET /api/status. Every
//! body carries a `success` flag; errors add a human-readable `error`.

use std::str::FromStr;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use kiroq_core::index::pending_for;
use kiroq_core::types::{validate_body, Message, MessageDraft, Priority, Role, MAX_RESPONSE_LEN};
use kiroq_core::BridgeError;

use crate::server::GatewayState;

/// Response body for GET /api/messages.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub success: bool,
    /// Messages from Kiro still awaiting an Amazon Q response.
    pub pending_messages: Vec<Message>,
    pub pending_count: usize,
    pub total_messages: usize,
    pub timestamp: String,
}

/// Request body for POST /api/respond.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Kept as a raw string so an invalid value yields a 400 body rather
    /// than a deserialization rejection.
    #[serde(default)]
    pub priority: Option<String>,
}

/// Response body for POST /api/respond.
#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub success: bool,
    pub message_id: String,
    pub timestamp: String,
}

/// Response body for GET /api/status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub bridge_active: bool,
    pub version: String,
    pub pending_messages: usize,
    pub total_messages: usize,
    pub message_file: String,
    pub timestamp: String,
}

/// Error body: `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> ErrorBody {
        ErrorBody {
            success: false,
            error: error.into(),
        }
    }
}

/// GET /api/messages
///
/// Pending messages for the answering role, with counts.
pub async fn get_messages(State(state): State<GatewayState>) -> Json<MessagesResponse> {
    let messages = state.store.load_all().await;
    let pending = pending_for(&messages, Role::AmazonQ, None);
    Json(MessagesResponse {
        success: true,
        pending_count: pending.len(),
        total_messages: messages.len(),
        pending_messages: pending,
        timestamp: kiroq_core::types::now_timestamp(),
    })
}

/// POST /api/respond
///
/// Appends an Amazon Q answer and marks the referenced question responded.
/// 400 on a malformed, empty, or invalid body; the store is never touched
/// on failure. The body is parsed by hand so even a non-JSON payload gets
/// the structured `{"success":false,"error":...}` shape.
pub async fn post_respond(
    State(state): State<GatewayState>,
    raw: String,
) -> Result<Json<RespondResponse>, (StatusCode, Json<ErrorBody>)> {
    let body: RespondRequest = serde_json::from_str(&raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new(format!("Invalid JSON: {e}"))),
        )
    })?;
    if body.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Message required")),
        ));
    }
    let text = validate_body(&body.message, MAX_RESPONSE_LEN)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorBody::new(reason(&e)))))?;
    let priority = match body.priority.as_deref() {
        Some(raw) => Priority::from_str(raw).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(format!(
                    "invalid priority {raw:?}: must be \"low\", \"normal\", or \"high\""
                ))),
            )
        })?,
        None => Priority::Normal,
    };

    let mut draft = MessageDraft::new(Role::AmazonQ, text)
        .priority(priority)
        .source("http_api");
    if let Some(ref parent) = body.reply_to {
        draft = draft.reply_to(parent.clone());
    }
    let stored = state.store.append(draft).await.map_err(internal)?;
    if let Some(ref parent) = body.reply_to {
        state.store.mark_responded(parent).await.map_err(internal)?;
    }

    Ok(Json(RespondResponse {
        success: true,
        message_id: stored.id,
        timestamp: stored.timestamp,
    }))
}

/// GET /api/status
///
/// Liveness plus message counts.
pub async fn get_status(State(state): State<GatewayState>) -> Json<StatusResponse> {
    let messages = state.store.load_all().await;
    let pending = pending_for(&messages, Role::AmazonQ, None);
    Json(StatusResponse {
        success: true,
        bridge_active: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        pending_messages: pending.len(),
        total_messages: messages.len(),
        message_file: state.message_file.clone(),
        timestamp: kiroq_core::types::now_timestamp(),
    })
}

/// Fallback for every unknown path or method.
pub async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("Endpoint not found")),
    )
}

fn reason(err: &BridgeError) -> String {
    match err {
        BridgeError::Validation(reason) => reason.clone(),
        other => other.to_string(),
    }
}

fn internal(err: BridgeError) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(err.to_string())),
    )
}
