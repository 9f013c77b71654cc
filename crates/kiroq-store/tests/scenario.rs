// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end store + index scenario: ping from Kiro, pong from Amazon Q.

use kiroq_config::model::StoreSection;
use kiroq_core::index::{pending_for, recent_history, HistoryScope};
use kiroq_core::types::{MessageDraft, MessageStatus, Role};
use kiroq_core::MessageLog;
use kiroq_store::FileMessageStore;
use tempfile::TempDir;

#[tokio::test]
async fn ping_pong_clears_pending_and_orders_history() {
    let dir = TempDir::new().unwrap();
    let store = FileMessageStore::new(&StoreSection {
        message_file: dir.path().join(".kiro-q-messages.json"),
        legacy_file: None,
        max_messages: 100,
    });

    // send {message:"ping", from:"Kiro"}
    let ping = store
        .append(MessageDraft::new(Role::Kiro, "ping"))
        .await
        .unwrap();
    assert_eq!(ping.status, MessageStatus::Queued);
    assert_eq!(ping.to, Role::AmazonQ);

    let pending = pending_for(&store.load_all().await, Role::AmazonQ, None);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, ping.id);

    // respond {message:"pong", reply_to:<id>}
    let pong = store
        .append(MessageDraft::new(Role::AmazonQ, "pong").reply_to(ping.id.clone()))
        .await
        .unwrap();
    store.mark_responded(&ping.id).await.unwrap();

    let messages = store.load_all().await;
    assert!(pending_for(&messages, Role::AmazonQ, None).is_empty());

    let history = recent_history(&messages, 2, HistoryScope::All);
    assert_eq!(history[0].message, "ping");
    assert_eq!(history[0].status, MessageStatus::Responded);
    assert_eq!(history[1].message, "pong");
    assert_eq!(history[1].reply_to.as_deref(), Some(ping.id.as_str()));
    assert_eq!(pong.status, MessageStatus::Delivered);
}
