// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API gateway for the KiroQ bridge.
//!
//! Three JSON routes over the shared message log, CORS-open so Amazon Q
//! can reach the bridge from anywhere on the local machine.

pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, GatewayState, ServerConfig};
