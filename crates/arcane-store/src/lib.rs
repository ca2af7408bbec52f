// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed document store gateway for Arcane Relay.
//!
//! Four collections (sessions, players, messages, story states) persisted
//! as JSON document bodies with denormalized columns for equality and
//! ordering queries. Writes are field-level merges where the domain calls
//! for them, serialized through one background connection; every committed
//! write is announced on a broadcast change feed consumed by live client
//! subscriptions.
//!
//! There is NO cross-document atomicity: the session + owner-player +
//! story-state creation sequence is three independent writes, and a crash
//! in between can leave a session without its story state. Readers
//! tolerate the gap; see DESIGN.md.

pub mod database;
pub mod merge;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::Database;
pub use merge::merge_document;
pub use store::{ChangeEvent, Collection, DocumentStore, decode_document};
