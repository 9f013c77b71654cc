// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ask protocol: append a question, then poll the store until a
//! correlated answer appears or the deadline elapses.
//!
//! Three states: Sent -> Answered | TimedOut. Between polls the engine
//! suspends on `tokio::time::sleep`; it never spins. A timeout is a
//! successful outcome carrying the still-queued question, never an error.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use kiroq_core::types::{timestamp_after, within_reply_window, Message, MessageDraft, Priority, Role};
use kiroq_core::{BridgeError, MessageLog};

/// Engine defaults; each [`AskRequest`] can override the timing fields.
#[derive(Debug, Clone)]
pub struct AskConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    /// Untagged answers arriving within this window of the question count
    /// as replies (loose fallback correlation, preserved from the wire
    /// protocol's documented behavior).
    pub reply_window: Duration,
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
            reply_window: Duration::from_secs(kiroq_core::types::REPLY_WINDOW_SECS),
        }
    }
}

/// One question to post and wait on.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub question: String,
    pub context: Option<String>,
    pub priority: Priority,
    pub project: Option<String>,
    pub max_wait: Option<Duration>,
    pub poll_interval: Option<Duration>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: None,
            priority: Priority::Normal,
            project: None,
            max_wait: None,
            poll_interval: None,
        }
    }
}

/// Terminal outcome of one ask run.
#[derive(Debug, Clone)]
pub enum AskOutcome {
    /// A correlated answer arrived before the deadline.
    Answered { question: Message, answer: Message },
    /// The deadline elapsed (or the caller cancelled). The question stays
    /// queued in the store for later manual retrieval.
    TimedOut { question: Message, waited: Duration },
}

/// Synchronous request/response protocol built on the shared message log.
pub struct AskEngine {
    store: Arc<dyn MessageLog>,
    config: AskConfig,
}

impl AskEngine {
    pub fn new(store: Arc<dyn MessageLog>, config: AskConfig) -> Self {
        Self { store, config }
    }

    /// Post `request` as a question from Kiro, then poll for Amazon Q's
    /// answer. The only suspending operation in the system: it sleeps the
    /// poll interval between full store reloads and returns on the first
    /// match, the deadline, or cancellation.
    pub async fn ask(
        &self,
        request: AskRequest,
        cancel: &CancellationToken,
    ) -> Result<AskOutcome, BridgeError> {
        let body = match &request.context {
            Some(ctx) => format!("{}\n\nContext: {ctx}", request.question),
            None => request.question.clone(),
        };
        let mut draft = MessageDraft::new(Role::Kiro, body).priority(request.priority);
        if let Some(project) = request.project {
            draft = draft.project(project);
        }
        let question = self.store.append(draft).await?;
        debug!(id = %question.id, "question posted, polling for answer");

        let poll_interval = request.poll_interval.unwrap_or(self.config.poll_interval);
        let max_wait = request.max_wait.unwrap_or(self.config.max_wait);
        let started = Instant::now();
        let deadline = started + max_wait;

        loop {
            let now = Instant::now();
            if now >= deadline {
                debug!(id = %question.id, "ask deadline elapsed");
                return Ok(AskOutcome::TimedOut {
                    question,
                    waited: now - started,
                });
            }
            let nap = poll_interval.min(deadline - now);
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(id = %question.id, "ask cancelled");
                    return Ok(AskOutcome::TimedOut {
                        question,
                        waited: started.elapsed(),
                    });
                }
                _ = sleep(nap) => {}
            }

            let messages = self.store.load_all().await;
            if let Some(answer) = find_answer(&messages, &question, self.config.reply_window) {
                debug!(question = %question.id, answer = %answer.id, "answer correlated");
                return Ok(AskOutcome::Answered { question, answer });
            }
        }
    }
}

/// First message from the answering role, addressed back to the asker, that
/// lands after the question and is either explicitly threaded to it or
/// arrives within the reply window.
fn find_answer(messages: &[Message], question: &Message, window: Duration) -> Option<Message> {
    let asker = question.from;
    messages
        .iter()
        .find(|m| {
            m.from == asker.peer()
                && m.to == asker
                && timestamp_after(&m.timestamp, &question.timestamp)
                && (m.reply_to.as_deref() == Some(question.id.as_str())
                    || within_reply_window(&m.timestamp, &question.timestamp, window))
        })
        .cloned()
}
