// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP service for Arcane Relay.
//!
//! Exposes the five callable commands (create/join/start/sendMessage/
//! validatePuzzle) behind anonymous-token auth and fixed-window rate
//! limiting, plus the GM narration SSE stream.

pub mod auth;
pub mod codegen;
pub mod gm;
pub mod handlers;
pub mod puzzle;
pub mod rate_limit;
pub mod server;

pub use auth::{AuthConfig, Identity};
pub use gm::GmScript;
pub use rate_limit::{RateLimiter, RatePolicy};
pub use server::{AppState, ServerConfig, build_router, default_policies, serve_on, start_server};
