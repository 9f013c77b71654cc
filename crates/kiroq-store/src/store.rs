// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed implementation of [`MessageLog`].
//!
//! The store is a single pretty-printed JSON array, capped at the configured
//! number of records with oldest-first eviction. Every operation is a whole-
//! document read-modify-write; there is no cross-process locking, so
//! concurrent writers can race and the later writer's full rewrite wins.
//! That lost-update hazard is a documented property of the bridge, not a bug
//! to paper over here.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use kiroq_config::model::StoreSection;
use kiroq_core::types::{Message, MessageDraft, MessageStatus};
use kiroq_core::{BridgeError, MessageLog};

/// JSON-array message store at a workspace-local path, folding in records
/// from a legacy home-directory document when one is present.
pub struct FileMessageStore {
    message_file: PathBuf,
    legacy_file: Option<PathBuf>,
    max_messages: usize,
}

impl FileMessageStore {
    pub fn new(config: &StoreSection) -> Self {
        Self {
            message_file: config.message_file.clone(),
            legacy_file: config.legacy_file.clone(),
            max_messages: config.max_messages,
        }
    }

    /// Path of the live document. Exposed for status reporting.
    pub fn message_file(&self) -> &Path {
        &self.message_file
    }

    /// Read and parse one document. A missing file is silent; anything
    /// unreadable or unparsable is logged and treated as absent. The store
    /// deliberately recovers from corruption by starting fresh.
    fn read_document(path: &Path) -> Option<Vec<Message>> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "message file unreadable, starting fresh");
                return None;
            }
        };
        match serde_json::from_str::<Vec<Message>>(&data) {
            Ok(messages) => Some(messages),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "message file corrupt, starting fresh");
                None
            }
        }
    }

    /// Load the live document, folding in the legacy home-directory file.
    ///
    /// The old helper scripts dual-wrote both locations, so the legacy file
    /// can hold records the workspace file lacks and vice versa. Whenever the
    /// legacy file has content, both documents are merged: dedup by id with
    /// the workspace copy winning, ordered by timestamp. A merge that changed
    /// anything is written back to the workspace path.
    fn load_document(&self) -> Vec<Message> {
        let live = Self::read_document(&self.message_file);
        let legacy = match &self.legacy_file {
            Some(path) if path.exists() => Self::read_document(path).unwrap_or_default(),
            _ => Vec::new(),
        };
        if legacy.is_empty() {
            return live.unwrap_or_default();
        }

        let live = live.unwrap_or_default();
        let live_count = live.len();
        let mut merged = dedup_by_id(live.into_iter().chain(legacy).collect());
        merged.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        if merged.len() > live_count || !self.message_file.exists() {
            info!(
                count = merged.len(),
                target = %self.message_file.display(),
                "merged legacy message file"
            );
            match self.persist(merged.clone()) {
                Ok(capped) => return capped,
                Err(e) => warn!(error = %e, "legacy merge write failed; continuing in memory"),
            }
        }
        merged
    }

    /// Cap-truncate and rewrite the whole document (pretty-printed).
    fn persist(&self, mut messages: Vec<Message>) -> Result<Vec<Message>, BridgeError> {
        if messages.len() > self.max_messages {
            let evicted = messages.len() - self.max_messages;
            messages.drain(..evicted);
            debug!(evicted, cap = self.max_messages, "evicted oldest messages");
        }
        if let Some(parent) = self.message_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(BridgeError::storage)?;
            }
        }
        let json = serde_json::to_string_pretty(&messages).map_err(|e| BridgeError::Storage {
            source: Box::new(e),
        })?;
        fs::write(&self.message_file, json).map_err(BridgeError::storage)?;
        Ok(messages)
    }
}

/// Keep the first occurrence of each id, preserving order.
fn dedup_by_id(messages: Vec<Message>) -> Vec<Message> {
    let mut seen = std::collections::HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen.insert(m.id.clone()))
        .collect()
}

#[async_trait]
impl MessageLog for FileMessageStore {
    async fn load_all(&self) -> Vec<Message> {
        self.load_document()
    }

    async fn append(&self, draft: MessageDraft) -> Result<Message, BridgeError> {
        let mut messages = self.load_document();
        let record = Message::from_draft(draft);
        messages.push(record.clone());
        self.persist(messages)?;
        debug!(id = %record.id, from = %record.from, "appended message");
        Ok(record)
    }

    async fn mark_responded(&self, id: &str) -> Result<bool, BridgeError> {
        let mut messages = self.load_document();
        let mut flipped = false;
        if let Some(msg) = messages.iter_mut().find(|m| m.id == id) {
            // Forward-only: queued -> responded. Delivered and responded
            // records are terminal and never regress.
            if msg.status == MessageStatus::Queued {
                msg.status = MessageStatus::Responded;
                flipped = true;
            }
        }
        if flipped {
            self.persist(messages)?;
            debug!(id, "marked responded");
        }
        Ok(flipped)
    }
}
