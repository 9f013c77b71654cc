// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC 2.0 framing for the tool-call protocol: one JSON object per
//! line in each direction.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Protocol revision reported by the `initialize` handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
/// Server identity reported by the `initialize` handshake.
pub const SERVER_NAME: &str = "kiroq-bridge";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Standard JSON-RPC error codes used on this boundary.
pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// One inbound request line, already parsed from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    /// Number, string, or absent. Echoed back verbatim.
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// One outbound response line. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Response {
        Response {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, code: i64, message: impl Into<String>) -> Response {
        Response {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Tool results carry a single text content block.
pub fn text_result(text: impl Into<String>) -> Value {
    json!({
        "content": [{ "type": "text", "text": text.into() }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_omits_error_field() {
        let response = Response::ok(json!(1), json!({"ready": true}));
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["jsonrpc"], "2.0");
        assert_eq!(wire["id"], 1);
        assert_eq!(wire["result"]["ready"], true);
        assert!(wire.get("error").is_none());
    }

    #[test]
    fn error_response_carries_code_and_message() {
        let response = Response::err(json!("abc"), METHOD_NOT_FOUND, "Method not found: nope");
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["error"]["code"], -32601);
        assert_eq!(wire["error"]["message"], "Method not found: nope");
        assert!(wire.get("result").is_none());
    }

    #[test]
    fn request_tolerates_missing_params_and_id() {
        let request: Request = serde_json::from_str(r#"{"method":"tools/list"}"#).unwrap();
        assert_eq!(request.method, "tools/list");
        assert!(request.params.is_null());
        assert!(request.id.is_null());
    }

    #[test]
    fn text_result_shape() {
        let result = text_result("hello");
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "hello");
    }
}
