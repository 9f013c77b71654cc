// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation index: pending/responded views derived from a loaded
//! message sequence.
//!
//! Everything here is a pure function over `&[Message]`. The store is the
//! single source of truth; no derived state is ever persisted, and every
//! query recomputes from a fresh load.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::types::{timestamp_after, Message, MessageStatus, Role};

/// How many leading words of each body feed the keyword sample.
const KEYWORD_SAMPLE_WORDS: usize = 5;
/// Minimum word length to count as a keyword.
const KEYWORD_MIN_LEN: usize = 4;
/// Keywords reported per project.
const KEYWORD_TOP_N: usize = 3;

/// Project filter for [`recent_history`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScope<'a> {
    /// Only messages tagged with this project.
    Project(&'a str),
    /// Messages from every project.
    All,
}

/// Messages addressed to `role` that still await its response.
///
/// A candidate is pending when it is a queued message from the peer role,
/// and no message authored by `role` back to the peer either names it in
/// `reply_to` or carries a strictly later timestamp. The temporal half of
/// that rule is a deliberately loose fallback for untagged replies: an
/// unrelated later message from `role` counts as a response. Callers must
/// not "fix" this; it is the documented correlation policy.
pub fn pending_for(messages: &[Message], role: Role, project: Option<&str>) -> Vec<Message> {
    let peer = role.peer();
    messages
        .iter()
        .filter(|m| {
            m.from == peer
                && m.to == role
                && m.status == MessageStatus::Queued
                && project.is_none_or(|p| m.project == p)
        })
        .filter(|candidate| {
            !messages.iter().any(|reply| {
                reply.from == role
                    && reply.to == peer
                    && (reply.reply_to.as_deref() == Some(candidate.id.as_str())
                        || timestamp_after(&reply.timestamp, &candidate.timestamp))
            })
        })
        .cloned()
        .collect()
}

/// Last `n` messages in store order, optionally restricted to one project.
pub fn recent_history(messages: &[Message], n: usize, scope: HistoryScope<'_>) -> Vec<Message> {
    let filtered: Vec<&Message> = messages
        .iter()
        .filter(|m| match scope {
            HistoryScope::Project(p) => m.project == p,
            HistoryScope::All => true,
        })
        .collect();
    filtered
        .into_iter()
        .rev()
        .take(n)
        .rev()
        .cloned()
        .collect()
}

/// Messages threaded to `id`: the record itself, the record it answers
/// (when threaded), and every reply naming it.
pub fn related_messages(messages: &[Message], id: &str) -> Vec<Message> {
    let parent_id = messages
        .iter()
        .find(|m| m.id == id)
        .and_then(|m| m.reply_to.clone());
    messages
        .iter()
        .filter(|m| {
            m.id == id
                || m.reply_to.as_deref() == Some(id)
                || parent_id.as_deref() == Some(m.id.as_str())
        })
        .cloned()
        .collect()
}

/// Aggregate statistics for one project tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectStats {
    pub total: usize,
    pub from_kiro: usize,
    pub from_amazon_q: usize,
    pub last_activity: Option<String>,
    /// Lightweight topic hint: lower-cased word-frequency sample over the
    /// first few words of each body. Not a search index.
    pub top_keywords: Vec<String>,
}

/// Group all messages by project tag and compute per-project aggregates.
pub fn project_stats(messages: &[Message]) -> BTreeMap<String, ProjectStats> {
    let mut grouped: BTreeMap<String, Vec<&Message>> = BTreeMap::new();
    for msg in messages {
        grouped.entry(msg.project.clone()).or_default().push(msg);
    }

    grouped
        .into_iter()
        .map(|(project, msgs)| {
            let mut stats = ProjectStats {
                total: msgs.len(),
                ..ProjectStats::default()
            };
            let mut counts: HashMap<String, usize> = HashMap::new();
            for msg in &msgs {
                match msg.from {
                    Role::Kiro => stats.from_kiro += 1,
                    Role::AmazonQ => stats.from_amazon_q += 1,
                }
                match &stats.last_activity {
                    Some(latest) if !timestamp_after(&msg.timestamp, latest) => {}
                    _ => stats.last_activity = Some(msg.timestamp.clone()),
                }
                for word in sample_keywords(&msg.message) {
                    *counts.entry(word).or_default() += 1;
                }
            }
            stats.top_keywords = top_keywords(counts);
            (project, stats)
        })
        .collect()
}

/// Lexicographically ordered `(project, stats)` pairs.
pub fn list_projects(messages: &[Message]) -> Vec<(String, ProjectStats)> {
    project_stats(messages).into_iter().collect()
}

fn sample_keywords(body: &str) -> Vec<String> {
    body.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.chars().count() >= KEYWORD_MIN_LEN)
        .take(KEYWORD_SAMPLE_WORDS)
        .collect()
}

fn top_keywords(counts: HashMap<String, usize>) -> Vec<String> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // Count descending, then alphabetical for a stable report.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(KEYWORD_TOP_N)
        .map(|(word, _)| word)
        .collect()
}
