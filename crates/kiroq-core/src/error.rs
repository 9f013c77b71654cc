// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the KiroQ bridge.
//!
//! An ask-engine timeout is deliberately NOT an error variant: the engine
//! returns a distinct `TimedOut` outcome so callers can keep the pending
//! question id. Nothing here is fatal to a running adapter process; both
//! front ends translate these into structured response payloads.

use thiserror::Error;

/// The primary error type used across the bridge crates.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid TOML, bad values, unusable paths).
    #[error("configuration error: {0}")]
    Config(String),

    /// Message store I/O errors (directory creation, file write failure).
    ///
    /// Read-side corruption is NOT surfaced through this variant; the store
    /// recovers by treating the file as empty.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Request validation errors (empty message, length cap, bad enum value).
    /// The store is never mutated when one of these is returned.
    #[error("validation error: {0}")]
    Validation(String),

    /// HTTP gateway errors (bind failure, server error).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Wrap an I/O error as a storage error.
    pub fn storage(source: std::io::Error) -> Self {
        BridgeError::Storage {
            source: Box::new(source),
        }
    }
}
