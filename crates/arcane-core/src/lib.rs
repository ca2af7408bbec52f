// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Arcane Relay collaborative storytelling service.
//!
//! This crate provides the error taxonomy, persisted document types, and
//! shared command request/response types used throughout the workspace.
//! It carries no I/O; the store, server, and client crates build on it.

pub mod code;
pub mod commands;
pub mod error;
pub mod time;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ArcaneError;
pub use types::{
    AuthorKind, DONE_SENTINEL, FlagValue, GmPayload, Message, Player, Session, SessionStatus,
    StoryState, player_doc_id,
};
