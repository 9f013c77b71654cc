// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool-call dispatch: translates JSON-RPC requests into core operations.
//!
//! Every handler reloads the store fresh, validates before mutating, and
//! renders a plain-text payload. Validation failures map to `-32602`,
//! unknown methods and tools to `-32601`, storage failures to `-32603`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use kiroq_core::index::{list_projects, pending_for, recent_history, related_messages, HistoryScope};
use kiroq_core::types::{
    current_project, validate_body, MessageDraft, Priority, Role, MAX_RESPONSE_LEN, MAX_SEND_LEN,
};
use kiroq_core::{BridgeError, MessageLog};
use kiroq_engine::{AskConfig, AskEngine, AskOutcome, AskRequest};

use crate::protocol::{
    text_result, Request, Response, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND,
    PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION,
};

/// Default history depth for the `status` tool.
const STATUS_DEFAULT_COUNT: usize = 5;
/// `status` clamps the requested history depth into this range.
const STATUS_MAX_COUNT: usize = 50;
/// Body previews in status text are cut at this many characters.
const PREVIEW_LEN: usize = 100;

/// Stateless dispatcher over the shared message log.
pub struct ToolServer {
    store: Arc<dyn MessageLog>,
    engine: AskEngine,
}

impl ToolServer {
    pub fn new(store: Arc<dyn MessageLog>, ask: AskConfig) -> Self {
        let engine = AskEngine::new(store.clone(), ask);
        Self { store, engine }
    }

    /// Dispatch one parsed request. Never fails; every outcome is a
    /// well-formed [`Response`].
    pub async fn handle_request(&self, request: Request, cancel: &CancellationToken) -> Response {
        let Request { method, params, id } = request;
        debug!(%method, "rpc request");
        match method.as_str() {
            "initialize" => Response::ok(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION }
                }),
            ),
            "initialized" | "notifications/initialized" => Response::ok(id, json!({})),
            "tools/list" => Response::ok(id, json!({ "tools": tool_catalog() })),
            "tools/call" => self.handle_tool_call(id, &params, cancel).await,
            other => Response::err(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        }
    }

    async fn handle_tool_call(
        &self,
        id: Value,
        params: &Value,
        cancel: &CancellationToken,
    ) -> Response {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let empty = json!({});
        let args = params.get("arguments").unwrap_or(&empty);
        let result = match name {
            "status" => self.tool_status(args).await,
            "send" => self.tool_send(args).await,
            "ask" => self.tool_ask(args, cancel).await,
            "init_session" => self.tool_init_session().await,
            "related_messages" => self.tool_related_messages(args).await,
            "list_projects" => self.tool_list_projects(args).await,
            other => {
                return Response::err(id, METHOD_NOT_FOUND, format!("Unknown tool: {other}"));
            }
        };
        match result {
            Ok(value) => Response::ok(id, value),
            Err(err) => Response::err(id, error_code(&err), error_reason(&err)),
        }
    }

    /// `send`: append one message. With `from = "Amazon Q"` and a `reply_to`
    /// this is the respond path: the referenced question is flipped to
    /// `responded` after the answer lands.
    async fn tool_send(&self, args: &Value) -> Result<Value, BridgeError> {
        let from = match args.get("from").and_then(Value::as_str) {
            Some(raw) => Role::from_str(raw).map_err(|_| {
                BridgeError::Validation(format!(
                    "invalid sender {raw:?}: must be \"Kiro\" or \"Amazon Q\""
                ))
            })?,
            None => Role::Kiro,
        };
        let limit = match from {
            Role::Kiro => MAX_SEND_LEN,
            Role::AmazonQ => MAX_RESPONSE_LEN,
        };
        let body = validate_body(args.get("message").and_then(Value::as_str).unwrap_or(""), limit)?;
        let priority = parse_priority(args)?;
        let reply_to = args
            .get("reply_to")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut draft = MessageDraft::new(from, body.clone())
            .priority(priority)
            .source("mcp");
        if let Some(ref parent) = reply_to {
            draft = draft.reply_to(parent.clone());
        }
        let stored = self.store.append(draft).await?;
        if from == Role::AmazonQ {
            if let Some(ref parent) = reply_to {
                self.store.mark_responded(parent).await?;
            }
        }

        let mut text = format!(
            "Message sent to {}\n\nID: {}\nFrom: {}\nTo: {}\nMessage: {}\nPriority: {}\nTimestamp: {}",
            stored.to, stored.id, stored.from, stored.to, body, priority, stored.timestamp
        );
        if let Some(parent) = reply_to {
            text.push_str(&format!("\nReplying to: {parent}"));
        }
        Ok(text_result(text))
    }

    /// `status`: bridge liveness, recent history, and the pending alert.
    async fn tool_status(&self, args: &Value) -> Result<Value, BridgeError> {
        let show_messages = args
            .get("show_messages")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let message_count = args
            .get("message_count")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(STATUS_DEFAULT_COUNT)
            .clamp(1, STATUS_MAX_COUNT);
        let project = args.get("project").and_then(Value::as_str);

        let messages = self.store.load_all().await;
        let pending = pending_for(&messages, Role::AmazonQ, project);

        let header = json!({
            "bridge_active": true,
            "version": SERVER_VERSION,
            "current_project": current_project(),
            "timestamp": kiroq_core::types::now_timestamp(),
        });
        let mut text = format!(
            "Kiro-Q Bridge status\n\n{}",
            serde_json::to_string_pretty(&header).unwrap_or_default()
        );

        if show_messages && !messages.is_empty() {
            let scope = match project {
                Some(p) => HistoryScope::Project(p),
                None => HistoryScope::All,
            };
            text.push_str("\n\nRecent conversation history:\n");
            for msg in recent_history(&messages, message_count, scope) {
                text.push_str(&format!(
                    "\n[{}] {} -> {}:\n{}\n",
                    msg.timestamp,
                    msg.from,
                    msg.to,
                    preview(&msg.message)
                ));
            }
        }

        if pending.is_empty() {
            text.push_str("\n\nNo pending messages: all Kiro messages have been responded to.");
        } else {
            text.push_str(&format!(
                "\n\n{} message(s) from Kiro awaiting Amazon Q response:\n",
                pending.len()
            ));
            for (i, msg) in pending.iter().enumerate() {
                text.push_str(&format!(
                    "\n{}. [{}] ID: {}\n   \"{}\"\n",
                    i + 1,
                    msg.timestamp,
                    msg.id,
                    preview(&msg.message)
                ));
            }
            text.push_str(
                "\nUse send with from=\"Amazon Q\" and reply_to=<id> to respond.",
            );
        }

        text.push_str(&format!(
            "\n\nSession summary:\n- Total messages: {}\n- Pending responses: {}",
            messages.len(),
            pending.len()
        ));
        Ok(text_result(text))
    }

    /// `ask`: send-then-poll through the engine. A timeout is a normal
    /// result carrying the still-queued question id.
    async fn tool_ask(
        &self,
        args: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, BridgeError> {
        let question = validate_body(
            args.get("question").and_then(Value::as_str).unwrap_or(""),
            MAX_SEND_LEN,
        )?;
        let mut request = AskRequest::new(question);
        request.context = args
            .get("context")
            .and_then(Value::as_str)
            .map(str::to_string);
        request.priority = parse_priority(args)?;
        request.project = args
            .get("project")
            .and_then(Value::as_str)
            .map(str::to_string);
        request.max_wait = args
            .get("max_wait_seconds")
            .and_then(Value::as_u64)
            .map(Duration::from_secs);
        request.poll_interval = args
            .get("poll_interval_seconds")
            .and_then(Value::as_u64)
            .map(Duration::from_secs);

        match self.engine.ask(request, cancel).await? {
            AskOutcome::Answered { question, answer } => Ok(text_result(format!(
                "Answer received from {}\n\n{}\n\n(question {}, answer {})",
                answer.from, answer.message, question.id, answer.id
            ))),
            AskOutcome::TimedOut { question, waited } => Ok(text_result(format!(
                "No answer within {}s. Question {} remains queued; Amazon Q can respond later.",
                waited.as_secs(),
                question.id
            ))),
        }
    }

    /// `init_session`: a read-only snapshot to start a working session from.
    async fn tool_init_session(&self) -> Result<Value, BridgeError> {
        let messages = self.store.load_all().await;
        let pending = pending_for(&messages, Role::AmazonQ, None);
        let mut text = format!(
            "Session initialized. Bridge ready.\n\nProject: {}\nTotal messages: {}\nPending responses: {}",
            current_project(),
            messages.len(),
            pending.len()
        );
        for msg in &pending {
            text.push_str(&format!(
                "\n- [{}] {}: \"{}\"",
                msg.timestamp,
                msg.id,
                preview(&msg.message)
            ));
        }
        Ok(text_result(text))
    }

    /// `related_messages`: the thread around one message id.
    async fn tool_related_messages(&self, args: &Value) -> Result<Value, BridgeError> {
        let id = args
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| BridgeError::Validation("message id is required".to_string()))?;
        let messages = self.store.load_all().await;
        let thread = related_messages(&messages, id);
        if thread.is_empty() {
            return Ok(text_result(format!("No messages related to {id}")));
        }
        let rendered = serde_json::to_string_pretty(&thread)
            .map_err(|e| BridgeError::Internal(e.to_string()))?;
        Ok(text_result(format!(
            "{} message(s) in the thread of {id}:\n\n{rendered}",
            thread.len()
        )))
    }

    /// `list_projects`: per-project aggregates, current project flagged.
    async fn tool_list_projects(&self, args: &Value) -> Result<Value, BridgeError> {
        let show_details = args
            .get("show_details")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let messages = self.store.load_all().await;
        let projects = list_projects(&messages);
        if projects.is_empty() {
            return Ok(text_result("No messages recorded yet."));
        }

        let here = current_project();
        let mut text = format!("{} project(s):\n", projects.len());
        for (name, stats) in &projects {
            let marker = if *name == here { " (current)" } else { "" };
            text.push_str(&format!("\n{name}{marker}: {} message(s)", stats.total));
            if show_details {
                text.push_str(&format!(
                    "\n  from Kiro: {}, from Amazon Q: {}\n  last activity: {}\n  keywords: {}",
                    stats.from_kiro,
                    stats.from_amazon_q,
                    stats.last_activity.as_deref().unwrap_or("none"),
                    if stats.top_keywords.is_empty() {
                        "none".to_string()
                    } else {
                        stats.top_keywords.join(", ")
                    }
                ));
            }
        }
        Ok(text_result(text))
    }
}

fn parse_priority(args: &Value) -> Result<Priority, BridgeError> {
    match args.get("priority").and_then(Value::as_str) {
        Some(raw) => Priority::from_str(raw).map_err(|_| {
            BridgeError::Validation(format!(
                "invalid priority {raw:?}: must be \"low\", \"normal\", or \"high\""
            ))
        }),
        None => Ok(Priority::Normal),
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() > PREVIEW_LEN {
        let cut: String = body.chars().take(PREVIEW_LEN).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}

fn error_code(err: &BridgeError) -> i64 {
    match err {
        BridgeError::Validation(_) => INVALID_PARAMS,
        _ => INTERNAL_ERROR,
    }
}

fn error_reason(err: &BridgeError) -> String {
    match err {
        BridgeError::Validation(reason) => reason.clone(),
        other => other.to_string(),
    }
}

/// Static tool schemas for `tools/list`.
fn tool_catalog() -> Value {
    json!([
        {
            "name": "status",
            "description": "Bridge status, recent conversation history, and messages awaiting a response",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "show_messages": { "type": "boolean", "default": true, "description": "Include recent conversation history" },
                    "message_count": { "type": "number", "default": STATUS_DEFAULT_COUNT, "description": "Number of recent messages to show (1-50)" },
                    "project": { "type": "string", "description": "Restrict the view to one project tag" }
                },
                "required": []
            }
        },
        {
            "name": "send",
            "description": "Send a message to the other agent, or respond as Amazon Q with reply_to",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "message": { "type": "string", "description": "Message content" },
                    "from": { "type": "string", "enum": ["Kiro", "Amazon Q"], "default": "Kiro", "description": "Who is sending the message" },
                    "priority": { "type": "string", "enum": ["low", "normal", "high"], "default": "normal" },
                    "reply_to": { "type": "string", "description": "Message id this answers (optional)" }
                },
                "required": ["message"]
            }
        },
        {
            "name": "ask",
            "description": "Send a question and wait for a correlated answer, polling until the deadline",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "question": { "type": "string", "description": "Question to post" },
                    "context": { "type": "string", "description": "Extra context appended to the question body" },
                    "priority": { "type": "string", "enum": ["low", "normal", "high"], "default": "normal" },
                    "project": { "type": "string", "description": "Project tag for the question" },
                    "max_wait_seconds": { "type": "number", "default": 300, "description": "Give up after this many seconds" },
                    "poll_interval_seconds": { "type": "number", "default": 5, "description": "Seconds between store polls" }
                },
                "required": ["question"]
            }
        },
        {
            "name": "init_session",
            "description": "Initialize a working session: bridge snapshot plus pending messages",
            "inputSchema": { "type": "object", "properties": {}, "required": [] }
        },
        {
            "name": "related_messages",
            "description": "The conversation thread around one message id",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Message id to look up" }
                },
                "required": ["id"]
            }
        },
        {
            "name": "list_projects",
            "description": "Per-project message statistics, lexicographically ordered",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "show_details": { "type": "boolean", "default": false, "description": "Include role counts, last activity, and keywords" }
                },
                "required": []
            }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiroq_config::model::StoreSection;
    use kiroq_core::types::MessageStatus;
    use kiroq_store::FileMessageStore;
    use tempfile::TempDir;

    fn server(dir: &TempDir) -> (ToolServer, Arc<FileMessageStore>) {
        let store = Arc::new(FileMessageStore::new(&StoreSection {
            message_file: dir.path().join(".kiro-q-messages.json"),
            legacy_file: None,
            max_messages: 100,
        }));
        (
            ToolServer::new(store.clone(), AskConfig::default()),
            store,
        )
    }

    fn request(body: Value) -> Request {
        serde_json::from_value(body).unwrap()
    }

    async fn call(server: &ToolServer, body: Value) -> Response {
        server
            .handle_request(request(body), &CancellationToken::new())
            .await
    }

    fn result_text(response: &Response) -> String {
        response.result.as_ref().unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server_info() {
        let dir = TempDir::new().unwrap();
        let (server, _) = server(&dir);
        let response = call(&server, json!({"method": "initialize", "id": 1})).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn tools_list_exposes_all_six_tools() {
        let dir = TempDir::new().unwrap();
        let (server, _) = server(&dir);
        let response = call(&server, json!({"method": "tools/list", "id": 2})).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["status", "send", "ask", "init_session", "related_messages", "list_projects"]
        );
    }

    #[tokio::test]
    async fn unknown_method_and_tool_report_not_found() {
        let dir = TempDir::new().unwrap();
        let (server, _) = server(&dir);
        let response = call(&server, json!({"method": "resources/list", "id": 3})).await;
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 4, "params": {"name": "teleport"}}),
        )
        .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert!(error.message.contains("teleport"));
    }

    #[tokio::test]
    async fn send_rejects_empty_and_oversized_bodies_without_mutation() {
        let dir = TempDir::new().unwrap();
        let (server, store) = server(&dir);

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 5,
                   "params": {"name": "send", "arguments": {"message": "   "}}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let long = "x".repeat(MAX_SEND_LEN + 1);
        let response = call(
            &server,
            json!({"method": "tools/call", "id": 6,
                   "params": {"name": "send", "arguments": {"message": long}}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn send_rejects_invalid_priority_and_sender() {
        let dir = TempDir::new().unwrap();
        let (server, _) = server(&dir);

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 7,
                   "params": {"name": "send",
                              "arguments": {"message": "hi", "priority": "urgent"}}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 8,
                   "params": {"name": "send",
                              "arguments": {"message": "hi", "from": "HAL"}}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn send_then_respond_clears_the_pending_alert() {
        let dir = TempDir::new().unwrap();
        let (server, store) = server(&dir);

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 9,
                   "params": {"name": "send", "arguments": {"message": "ping"}}}),
        )
        .await;
        let text = result_text(&response);
        assert!(text.contains("Message sent to Amazon Q"));

        let ping = store.load_all().await[0].clone();
        assert_eq!(ping.status, MessageStatus::Queued);
        assert_eq!(ping.source.as_deref(), Some("mcp"));

        let status = call(
            &server,
            json!({"method": "tools/call", "id": 10,
                   "params": {"name": "status", "arguments": {}}}),
        )
        .await;
        assert!(result_text(&status).contains("1 message(s) from Kiro awaiting"));

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 11,
                   "params": {"name": "send",
                              "arguments": {"message": "pong", "from": "Amazon Q",
                                            "reply_to": ping.id}}}),
        )
        .await;
        assert!(result_text(&response).contains("Replying to"));

        let messages = store.load_all().await;
        assert_eq!(messages[0].status, MessageStatus::Responded);
        assert_eq!(messages[1].status, MessageStatus::Delivered);

        let status = call(
            &server,
            json!({"method": "tools/call", "id": 12,
                   "params": {"name": "status", "arguments": {}}}),
        )
        .await;
        assert!(result_text(&status).contains("No pending messages"));
    }

    #[tokio::test]
    async fn agent_responses_use_the_shorter_length_cap() {
        let dir = TempDir::new().unwrap();
        let (server, store) = server(&dir);
        let long = "x".repeat(MAX_RESPONSE_LEN + 1);
        let response = call(
            &server,
            json!({"method": "tools/call", "id": 13,
                   "params": {"name": "send",
                              "arguments": {"message": long, "from": "Amazon Q"}}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn ask_times_out_and_reports_the_queued_question() {
        let dir = TempDir::new().unwrap();
        let (server, store) = server(&dir);
        let response = call(
            &server,
            json!({"method": "tools/call", "id": 14,
                   "params": {"name": "ask",
                              "arguments": {"question": "anyone?",
                                            "max_wait_seconds": 1,
                                            "poll_interval_seconds": 1}}}),
        )
        .await;
        let text = result_text(&response);
        assert!(text.contains("No answer within"));
        assert!(text.contains("remains queued"));

        let messages = store.load_all().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(pending_for(&messages, Role::AmazonQ, None).len(), 1);
    }

    #[tokio::test]
    async fn related_messages_render_the_thread() {
        let dir = TempDir::new().unwrap();
        let (server, store) = server(&dir);
        let ping = store
            .append(MessageDraft::new(Role::Kiro, "ping"))
            .await
            .unwrap();
        store
            .append(MessageDraft::new(Role::AmazonQ, "pong").reply_to(ping.id.clone()))
            .await
            .unwrap();

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 15,
                   "params": {"name": "related_messages", "arguments": {"id": ping.id}}}),
        )
        .await;
        let text = result_text(&response);
        assert!(text.contains("2 message(s)"));
        assert!(text.contains("pong"));

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 16,
                   "params": {"name": "related_messages", "arguments": {"id": "ghost"}}}),
        )
        .await;
        assert!(result_text(&response).contains("No messages related to ghost"));
    }

    #[tokio::test]
    async fn list_projects_orders_and_details() {
        let dir = TempDir::new().unwrap();
        let (server, store) = server(&dir);
        store
            .append(MessageDraft::new(Role::Kiro, "zeta work").project("zeta"))
            .await
            .unwrap();
        store
            .append(MessageDraft::new(Role::Kiro, "alpha work").project("alpha"))
            .await
            .unwrap();

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 17,
                   "params": {"name": "list_projects",
                              "arguments": {"show_details": true}}}),
        )
        .await;
        let text = result_text(&response);
        let alpha = text.find("alpha").unwrap();
        let zeta = text.find("zeta").unwrap();
        assert!(alpha < zeta);
        assert!(text.contains("from Kiro: 1"));
    }

    #[tokio::test]
    async fn init_session_lists_pending_work() {
        let dir = TempDir::new().unwrap();
        let (server, store) = server(&dir);
        store
            .append(MessageDraft::new(Role::Kiro, "still waiting"))
            .await
            .unwrap();

        let response = call(
            &server,
            json!({"method": "tools/call", "id": 18,
                   "params": {"name": "init_session"}}),
        )
        .await;
        let text = result_text(&response);
        assert!(text.contains("Session initialized"));
        assert!(text.contains("Pending responses: 1"));
        assert!(text.contains("still waiting"));
    }
}
