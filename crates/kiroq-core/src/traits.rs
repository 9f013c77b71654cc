// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage seam for the bridge message log.
//!
//! The file-backed store is the only implementation today, but callers in
//! the ask engine and both front-end adapters depend on this trait so a
//! future embedded store can slot in without touching them.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::types::{Message, MessageDraft};

/// Append-only, capacity-bounded message log.
///
/// Operations are whole-document read-modify-write with no cross-process
/// locking; concurrent writers can race and the later full-document write
/// wins.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Load the full ordered sequence. Corruption or a missing document is
    /// recovered as an empty sequence, never an error.
    async fn load_all(&self) -> Vec<Message>;

    /// Compose, append, cap-truncate, and persist. Returns the stored record
    /// with server-assigned id/timestamp filled in.
    async fn append(&self, draft: MessageDraft) -> Result<Message, BridgeError>;

    /// Flip a queued message to `responded`. Returns `false` (not an error)
    /// when no message with `id` exists. Never regresses a status.
    async fn mark_responded(&self, id: &str) -> Result<bool, BridgeError>;
}
