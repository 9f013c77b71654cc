// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the KiroQ bridge.
//!
//! Defines the persisted [`Message`] model, the pure conversation index,
//! the [`MessageLog`] storage trait, and the shared error taxonomy. The
//! store, ask engine, and both front-end adapters all build on this crate.

pub mod error;
pub mod index;
pub mod traits;
pub mod types;

pub use error::BridgeError;
pub use traits::MessageLog;
pub use types::{Message, MessageDraft, MessageStatus, Priority, Role};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = BridgeError::Config("bad port".into());
        let _storage = BridgeError::storage(std::io::Error::other("test"));
        let _validation = BridgeError::Validation("empty".into());
        let _gateway = BridgeError::Gateway {
            message: "bind failed".into(),
            source: None,
        };
        let _internal = BridgeError::Internal("oops".into());
    }

    #[test]
    fn ping_pong_scenario_through_the_index() {
        // send {message:"ping", from:"Kiro"} -> queued, addressed to Amazon Q
        let ping = Message::from_draft(
            MessageDraft::new(Role::Kiro, "ping").timestamp("2026-01-01T10:00:00-05:00"),
        );
        assert_eq!(ping.status, MessageStatus::Queued);
        assert_eq!(ping.to, Role::AmazonQ);

        // respond {message:"pong", reply_to:<id>}
        let pong = Message::from_draft(
            MessageDraft::new(Role::AmazonQ, "pong")
                .reply_to(ping.id.clone())
                .timestamp("2026-01-01T10:00:01-05:00"),
        );
        let mut answered = ping.clone();
        answered.status = MessageStatus::Responded;
        let log = vec![answered, pong];

        assert!(index::pending_for(&log, Role::AmazonQ, None).is_empty());
        let history = index::recent_history(&log, 2, index::HistoryScope::All);
        assert_eq!(history[0].message, "ping");
        assert_eq!(history[1].message, "pong");
    }
}
