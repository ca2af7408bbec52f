// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain document types shared by the server, store, and client.
//!
//! These mirror the persisted JSON document shapes. Field names serialize
//! in camelCase to match the wire/storage format; readers tolerate both
//! numeric and store-native timestamps (see [`crate::time`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::time;

/// Lifecycle of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Waiting for players to join; only state from which the owner may start.
    Lobby,
    /// Adventure in progress.
    Active,
    /// Adventure concluded.
    Finished,
}

/// Who authored a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthorKind {
    Player,
    Gm,
    Npc,
}

/// One shared adventure, identified by a short join code and owned by the
/// player who created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub code: String,
    pub status: SessionStatus,
    pub owner_id: String,
    #[serde(default, deserialize_with = "time::deserialize_opt_millis")]
    pub created_at: Option<i64>,
}

/// One player's membership in a session.
///
/// The document id is `"{sessionId}_{userId}"` so a re-join merges into the
/// existing record instead of duplicating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub display_name: String,
    pub is_owner: bool,
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub joined_at: i64,
}

/// Document id for a player record, keyed by (session, user).
pub fn player_doc_id(session_id: &str, user_id: &str) -> String {
    format!("{session_id}_{user_id}")
}

/// One chat message. Append-only, ordered by `created_at` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub author: AuthorKind,
    pub player_id: Option<String>,
    pub text: String,
    #[serde(deserialize_with = "time::deserialize_millis")]
    pub created_at: i64,
}

/// A value stored in the story-state flag map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// The mutable shared narrative context all players observe.
///
/// Exactly one per session. Mutated only through field-level merges
/// (puzzle flag merge, narration completion merge) — never overwritten
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryState {
    pub session_id: String,
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub public_hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_hints: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub flags: BTreeMap<String, FlagValue>,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default, deserialize_with = "time::deserialize_opt_millis")]
    pub updated_at: Option<i64>,
}

impl StoryState {
    /// The empty story state created alongside a new session.
    pub fn empty(session_id: impl Into<String>, now: i64) -> Self {
        Self {
            session_id: session_id.into(),
            narration: String::new(),
            public_hints: Vec::new(),
            private_hints: None,
            flags: BTreeMap::new(),
            inventory: Vec::new(),
            updated_at: Some(now),
        }
    }
}

/// Sentinel event datum that terminates a GM narration stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// The structured payload closing a GM narration stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmPayload {
    pub narration: String,
    #[serde(default)]
    pub public_hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_hints: Option<BTreeMap<String, Vec<String>>>,
}
