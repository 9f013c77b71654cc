// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message model for the KiroQ bridge.
//!
//! A [`Message`] is the sole persisted entity: one directional communication
//! between the two agent roles. Records are created once on send, optionally
//! flipped to `responded` exactly once, and destroyed only by FIFO eviction
//! when the store exceeds its cap.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BridgeError;

/// Default store cap: the most recent 100 messages survive, older records
/// are evicted regardless of status. Overridable through configuration.
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// Maximum body length for a normal send.
pub const MAX_SEND_LEN: usize = 10_000;

/// Maximum body length for an agent response.
pub const MAX_RESPONSE_LEN: usize = 5_000;

/// Fallback reply-correlation window used by the ask engine: an untagged
/// answer arriving within this many seconds of the question counts as a reply.
pub const REPLY_WINDOW_SECS: u64 = 60;

/// Wire format version tag carried by every record.
pub const WIRE_VERSION: &str = "v4";

/// One of the two cooperating agents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Role {
    Kiro,
    #[serde(rename = "Amazon Q")]
    #[strum(serialize = "Amazon Q")]
    AmazonQ,
}

impl Role {
    /// The other role. `to` is always the sender's peer.
    pub fn peer(self) -> Role {
        match self {
            Role::Kiro => Role::AmazonQ,
            Role::AmazonQ => Role::Kiro,
        }
    }

    /// Lowercase id prefix for messages authored by this role.
    pub fn slug(self) -> &'static str {
        match self {
            Role::Kiro => "kiro",
            Role::AmazonQ => "amazon-q",
        }
    }
}

/// Advisory message priority. Has no scheduling effect.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// Message lifecycle state. Transitions are forward-only:
/// `queued -> responded` when a correlated reply arrives, or `delivered`
/// (terminal) for messages authored by the answering role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStatus {
    Queued,
    Delivered,
    Responded,
}

fn default_project() -> String {
    "unknown".to_string()
}

fn default_version() -> String {
    WIRE_VERSION.to_string()
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// One persisted queue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id: sender slug + monotonic clock reading. Never reused.
    pub id: String,
    /// Fixed-offset timestamp, second resolution, used only for ordering.
    pub timestamp: String,
    /// Project segmentation tag. Defaults to the working directory basename
    /// on send and to "unknown" when absent in persisted data.
    #[serde(default = "default_project")]
    pub project: String,
    pub from: Role,
    pub to: Role,
    /// Free-text body. Bounded by [`MAX_SEND_LEN`] / [`MAX_RESPONSE_LEN`].
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
    /// Id of the message this answers, when explicitly threaded.
    #[serde(default)]
    pub reply_to: Option<String>,
    pub status: MessageStatus,
    /// Provenance metadata, advisory only.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub verified: bool,
}

/// Input for [`Message::from_draft`]. Server-assigned fields (`id`,
/// `timestamp`, `project`) are filled in when absent; `to` and `status`
/// are always derived from `from`.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub project: Option<String>,
    pub from: Role,
    pub message: String,
    pub priority: Priority,
    pub reply_to: Option<String>,
    pub source: Option<String>,
    pub verified: bool,
}

impl MessageDraft {
    pub fn new(from: Role, message: impl Into<String>) -> Self {
        Self {
            id: None,
            timestamp: None,
            project: None,
            from,
            message: message.into(),
            priority: Priority::Normal,
            reply_to: None,
            source: None,
            verified: false,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn reply_to(mut self, id: impl Into<String>) -> Self {
        self.reply_to = Some(id.into());
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

impl Message {
    /// Compose a full record from a draft.
    ///
    /// Messages authored by the answering role (Amazon Q) are born in the
    /// terminal `delivered` state; everything else starts `queued`.
    pub fn from_draft(draft: MessageDraft) -> Message {
        let from = draft.from;
        Message {
            id: draft.id.unwrap_or_else(|| next_message_id(from)),
            timestamp: draft.timestamp.unwrap_or_else(now_timestamp),
            project: draft.project.unwrap_or_else(current_project),
            from,
            to: from.peer(),
            message: draft.message,
            priority: draft.priority,
            reply_to: draft.reply_to,
            status: if from == Role::AmazonQ {
                MessageStatus::Delivered
            } else {
                MessageStatus::Queued
            },
            version: default_version(),
            source: draft.source,
            verified: draft.verified,
        }
    }
}

/// Validate and normalize a message body before any store mutation.
///
/// Trims surrounding whitespace, rejects empty bodies and bodies over
/// `limit` characters.
pub fn validate_body(text: &str, limit: usize) -> Result<String, BridgeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::Validation(
            "message cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > limit {
        return Err(BridgeError::Validation(format!(
            "message too long: maximum length is {limit} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Project tag for newly sent messages: basename of the working directory.
pub fn current_project() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown-project".to_string())
}

// Wire timestamps are second resolution with a fixed UTC-5 suffix, the
// format legacy documents already carry. They order messages; they are
// not authoritative wall-clock data.
const BRIDGE_UTC_OFFSET_SECS: i32 = -5 * 3600;

/// Current time in the bridge wire format, e.g. `2026-08-23T09:15:42-05:00`.
pub fn now_timestamp() -> String {
    let offset =
        FixedOffset::east_opt(BRIDGE_UTC_OFFSET_SECS).expect("UTC-5 is a valid fixed offset");
    Utc::now()
        .with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Parse a wire timestamp. Legacy records with unparsable timestamps yield
/// `None` and fall back to lexicographic ordering.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(ts).ok()
}

/// True when `a` is strictly later than `b`.
pub fn timestamp_after(a: &str, b: &str) -> bool {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => a > b,
        _ => a > b,
    }
}

/// True when `answer` lands at or after `question` and within `window` of it.
/// Unparsable timestamps never match.
pub fn within_reply_window(answer: &str, question: &str, window: Duration) -> bool {
    match (parse_timestamp(answer), parse_timestamp(question)) {
        (Some(a), Some(q)) => a >= q && (a - q).to_std().map(|d| d <= window).unwrap_or(false),
        _ => false,
    }
}

// Monotonic id clock. When the wall clock repeats a millisecond reading
// (or moves backwards), the counter advances past the last issued value so
// ids stay unique for the lifetime of the process.
static LAST_ID_CLOCK: AtomicI64 = AtomicI64::new(0);

/// Next unique message id for `from`, e.g. `kiro-v4-1766500000123`.
pub fn next_message_id(from: Role) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    loop {
        let prev = LAST_ID_CLOCK.load(Ordering::SeqCst);
        if candidate <= prev {
            candidate = prev + 1;
        }
        if LAST_ID_CLOCK
            .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            break;
        }
    }
    format!("{}-{}-{}", from.slug(), WIRE_VERSION, candidate)
}
