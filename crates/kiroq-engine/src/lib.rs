// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send-then-poll ask protocol for the KiroQ bridge.

pub mod ask;

pub use ask::{AskConfig, AskEngine, AskOutcome, AskRequest};
