// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./kiroq.toml` > `~/.config/kiroq/kiroq.toml`
//! > `/etc/kiroq/kiroq.toml`, with environment variable overrides via the
//! `KIROQ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KiroqConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kiroq/kiroq.toml` (system-wide)
/// 3. `~/.config/kiroq/kiroq.toml` (user XDG config)
/// 4. `./kiroq.toml` (local directory)
/// 5. `KIROQ_*` environment variables
pub fn load_config() -> Result<KiroqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KiroqConfig::default()))
        .merge(Toml::file("/etc/kiroq/kiroq.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("kiroq/kiroq.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("kiroq.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Useful for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KiroqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KiroqConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KiroqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KiroqConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `KIROQ_STORE_MESSAGE_FILE` must map to
/// `store.message_file`, not `store.message.file`.
fn env_provider() -> Env {
    Env::prefixed("KIROQ_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("store_", "store.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("ask_", "ask.", 1);
        mapped.into()
    })
}
