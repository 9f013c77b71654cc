// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-delimited JSON-RPC tool-call adapter for the KiroQ bridge.
//!
//! One JSON object per line on stdin, one per line on stdout. The dispatch
//! layer ([`tools`]) is transport-free and tested directly; [`server`] only
//! frames lines.

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::run_stdio;
pub use tools::ToolServer;
