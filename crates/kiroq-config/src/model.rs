// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the KiroQ bridge.
//!
//! Every operational knob (message file path, legacy fallback path, HTTP
//! port, message cap) is an explicit field here so tests can run against
//! temporary files and ports. All structs use `deny_unknown_fields` to
//! reject typo'd keys at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level bridge configuration.
///
/// Loaded from TOML files in the XDG hierarchy with `KIROQ_` environment
/// variable overrides. All sections default to usable values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KiroqConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Message store settings.
    #[serde(default)]
    pub store: StoreSection,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewaySection,

    /// Ask-engine (send-then-poll) defaults.
    #[serde(default)]
    pub ask: AskSection,
}

impl Default for KiroqConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: StoreSection::default(),
            gateway: GatewaySection::default(),
            ask: AskSection::default(),
        }
    }
}

/// Message store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Path to the workspace-local message document.
    #[serde(default = "default_message_file")]
    pub message_file: PathBuf,

    /// Legacy home-directory document, migrated once when the workspace
    /// file is absent. `None` disables migration.
    #[serde(default = "default_legacy_file")]
    pub legacy_file: Option<PathBuf>,

    /// Store cap; the oldest records beyond it are evicted on append.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            message_file: default_message_file(),
            legacy_file: default_legacy_file(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_message_file() -> PathBuf {
    PathBuf::from(".kiro-q-messages.json")
}

fn default_legacy_file() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".kiro").join("q-messages.json"))
}

fn default_max_messages() -> usize {
    kiroq_core::types::DEFAULT_MAX_MESSAGES
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind. 3847 spells KIRO on a phone keypad.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3847
}

/// Ask-engine defaults, overridable per call through tool parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AskSection {
    /// Seconds between store polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Deadline for a poll run before returning a timeout outcome.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Fallback correlation window for untagged answers.
    #[serde(default = "default_reply_window_secs")]
    pub reply_window_secs: u64,
}

impl Default for AskSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
            reply_window_secs: default_reply_window_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_wait_secs() -> u64 {
    300
}

fn default_reply_window_secs() -> u64 {
    kiroq_core::types::REPLY_WINDOW_SECS
}
