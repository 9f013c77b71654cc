// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file persistence layer for the KiroQ bridge.
//!
//! Implements [`kiroq_core::MessageLog`] over a single pretty-printed JSON
//! array with FIFO capping, lossy corruption recovery, and one-time legacy
//! path migration.

pub mod store;

pub use store::FileMessageStore;
