// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The client game-state store.
//!
//! One mutable snapshot of everything the UI shows: caller identity,
//! session, players, messages, story state, and the in-progress narration
//! chunk buffer. All mutation goes through update verbs on [`GameStore`];
//! the snapshot itself is held inside a `watch` channel, so every verb is
//! a single-writer fold and readers only ever observe complete snapshots.
//!
//! Only the session reference (id + code) survives restarts; everything
//! else is rebuilt from live subscriptions.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use arcane_core::{ArcaneError, FlagValue, GmPayload, Message, Player, Session, StoryState};

/// The client-visible state snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSnapshot {
    /// The caller's user id, set after sign-in.
    pub player_id: Option<String>,
    /// The session document, once loaded from a subscription.
    pub session: Option<Session>,
    /// Session reference usable before the document itself has loaded.
    pub session_id: Option<String>,
    pub session_code: Option<String>,
    /// True iff the session's owner is the caller. Recomputed whenever the
    /// caller identity or session changes.
    pub is_owner: bool,
    pub players: Vec<Player>,
    pub messages: Vec<Message>,
    pub story_state: Option<StoryState>,
    /// In-progress narration fragments; speculative display-only state,
    /// cleared at the start of each new stream.
    pub gm_stream: Vec<String>,
}

/// The slice of state that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSessionRef {
    pub session_id: Option<String>,
    pub session_code: Option<String>,
}

/// Single shared mutable snapshot with update verbs as the only mutation
/// path.
#[derive(Debug)]
pub struct GameStore {
    tx: watch::Sender<GameSnapshot>,
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(GameSnapshot::default());
        Self { tx }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> GameSnapshot {
        self.tx.borrow().clone()
    }

    /// Watch for snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<GameSnapshot> {
        self.tx.subscribe()
    }

    fn update(&self, f: impl FnOnce(&mut GameSnapshot)) {
        self.tx.send_modify(f);
    }

    pub fn set_player_id(&self, id: Option<String>) {
        self.update(|state| {
            state.is_owner = match (&state.session, &id) {
                (Some(session), Some(id)) => session.owner_id == *id,
                _ => false,
            };
            state.player_id = id;
        });
    }

    /// Replaces the session document. `code` overrides the stored session
    /// code when given; otherwise the document's code (or nothing) is used.
    pub fn set_session(&self, session: Option<Session>, code: Option<String>) {
        self.update(|state| {
            state.session_code = code.or_else(|| session.as_ref().map(|s| s.code.clone()));
            state.session_id = session.as_ref().map(|s| s.id.clone());
            state.is_owner = match (&session, &state.player_id) {
                (Some(session), Some(player_id)) => session.owner_id == *player_id,
                _ => false,
            };
            state.session = session;
        });
    }

    /// Records the session reference before the document has loaded.
    pub fn set_session_ref(&self, session_id: String, code: Option<String>) {
        self.update(|state| {
            state.session_id = Some(session_id);
            if code.is_some() {
                state.session_code = code;
            }
            if let (Some(session), Some(player_id)) = (&state.session, &state.player_id) {
                state.is_owner = session.owner_id == *player_id;
            }
        });
    }

    pub fn set_players(&self, players: Vec<Player>) {
        self.update(|state| state.players = players);
    }

    pub fn set_messages(&self, messages: Vec<Message>) {
        self.update(|state| state.messages = messages);
    }

    pub fn append_message(&self, message: Message) {
        self.update(|state| state.messages.push(message));
    }

    pub fn set_story_state(&self, story: Option<StoryState>) {
        self.update(|state| state.story_state = story);
    }

    /// Folds a GM final payload into the story state.
    ///
    /// Merges field-level into the existing story state; if none exists
    /// yet but a session reference does, synthesizes a minimal story state
    /// from the payload. With neither, this is a no-op.
    pub fn update_story_from_gm(&self, payload: &GmPayload) {
        self.update(|state| {
            if let Some(ref mut story) = state.story_state {
                story.narration = payload.narration.clone();
                story.public_hints = payload.public_hints.clone();
                if payload.private_hints.is_some() {
                    story.private_hints = payload.private_hints.clone();
                }
            } else if let Some(ref session_id) = state.session_id {
                state.story_state = Some(StoryState {
                    session_id: session_id.clone(),
                    narration: payload.narration.clone(),
                    public_hints: payload.public_hints.clone(),
                    private_hints: payload.private_hints.clone(),
                    flags: Default::default(),
                    inventory: Vec::new(),
                    updated_at: None,
                });
            }
        });
    }

    /// Merges into the story flags only. A no-op when no story state has
    /// loaded yet — flags never synthesize a story.
    pub fn patch_story_flags(&self, flags: impl IntoIterator<Item = (String, FlagValue)>) {
        self.update(|state| {
            if let Some(ref mut story) = state.story_state {
                story.flags.extend(flags);
            }
        });
    }

    pub fn push_gm_chunk(&self, chunk: &str) {
        self.update(|state| state.gm_stream.push(chunk.to_string()));
    }

    pub fn reset_gm_stream(&self) {
        self.update(|state| state.gm_stream.clear());
    }

    /// Clears everything except the caller identity.
    pub fn reset(&self) {
        self.update(|state| {
            let player_id = state.player_id.take();
            *state = GameSnapshot {
                player_id,
                ..GameSnapshot::default()
            };
        });
    }

    // --- persistence: only the session reference survives restarts ---

    pub fn persisted(&self) -> PersistedSessionRef {
        let state = self.tx.borrow();
        PersistedSessionRef {
            session_id: state.session_id.clone(),
            session_code: state.session_code.clone(),
        }
    }

    /// Writes the persisted session reference to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<(), ArcaneError> {
        let json =
            serde_json::to_string_pretty(&self.persisted()).map_err(|e| ArcaneError::Storage {
                source: Box::new(e),
            })?;
        std::fs::write(path, json).map_err(|e| ArcaneError::Storage {
            source: Box::new(e),
        })
    }

    /// Reads a persisted session reference, if one was saved.
    ///
    /// A corrupt file is treated as absent: persistence is a convenience,
    /// not a source of truth.
    pub fn load(path: &Path) -> Result<Option<PersistedSessionRef>, ArcaneError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ArcaneError::Storage {
                    source: Box::new(e),
                });
            }
        };
        match serde_json::from_str(&text) {
            Ok(persisted) => Ok(Some(persisted)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring corrupt persisted session reference");
                Ok(None)
            }
        }
    }

    /// Applies a previously persisted session reference.
    pub fn restore(&self, persisted: PersistedSessionRef) {
        if let Some(session_id) = persisted.session_id {
            self.set_session_ref(session_id, persisted.session_code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcane_core::SessionStatus;

    fn make_session(owner: &str) -> Session {
        Session {
            id: "s1".to_string(),
            code: "ABC234".to_string(),
            status: SessionStatus::Lobby,
            owner_id: owner.to_string(),
            created_at: Some(1),
        }
    }

    #[test]
    fn ownership_follows_identity_and_session() {
        let store = GameStore::new();
        assert!(!store.snapshot().is_owner);

        store.set_session(Some(make_session("u1")), None);
        assert!(!store.snapshot().is_owner);

        store.set_player_id(Some("u1".to_string()));
        assert!(store.snapshot().is_owner);

        store.set_player_id(Some("u2".to_string()));
        assert!(!store.snapshot().is_owner);

        store.set_player_id(Some("u1".to_string()));
        store.set_session(None, None);
        assert!(!store.snapshot().is_owner);
    }

    #[test]
    fn session_ref_is_usable_before_the_document_loads() {
        let store = GameStore::new();
        store.set_session_ref("s1".to_string(), Some("ABC234".to_string()));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.session_id.as_deref(), Some("s1"));
        assert_eq!(snapshot.session_code.as_deref(), Some("ABC234"));
        assert!(snapshot.session.is_none());

        // A later ref without a code keeps the known code.
        store.set_session_ref("s1".to_string(), None);
        assert_eq!(store.snapshot().session_code.as_deref(), Some("ABC234"));
    }

    #[test]
    fn set_session_prefers_explicit_code() {
        let store = GameStore::new();
        store.set_session(Some(make_session("u1")), Some("OVERRD".to_string()));
        assert_eq!(store.snapshot().session_code.as_deref(), Some("OVERRD"));

        store.set_session(Some(make_session("u1")), None);
        assert_eq!(store.snapshot().session_code.as_deref(), Some("ABC234"));
    }

    #[test]
    fn update_story_from_gm_merges_into_existing() {
        let store = GameStore::new();
        let mut story = StoryState::empty("s1", 1);
        story.flags.insert("openedDoorA".to_string(), FlagValue::Bool(true));
        store.set_story_state(Some(story));

        store.update_story_from_gm(&GmPayload {
            narration: "The door shudders.".to_string(),
            public_hints: vec!["Order matters".to_string()],
            private_hints: None,
        });

        let story = store.snapshot().story_state.unwrap();
        assert_eq!(story.narration, "The door shudders.");
        assert_eq!(story.public_hints, vec!["Order matters"]);
        // Untouched fields survive the merge.
        assert_eq!(story.flags["openedDoorA"], FlagValue::Bool(true));
    }

    #[test]
    fn update_story_from_gm_synthesizes_with_session_ref() {
        let store = GameStore::new();
        store.set_session_ref("s1".to_string(), None);

        store.update_story_from_gm(&GmPayload {
            narration: "It begins.".to_string(),
            public_hints: vec![],
            private_hints: None,
        });

        let story = store.snapshot().story_state.unwrap();
        assert_eq!(story.session_id, "s1");
        assert_eq!(story.narration, "It begins.");
        assert!(story.flags.is_empty());
    }

    #[test]
    fn update_story_from_gm_without_session_is_a_no_op() {
        let store = GameStore::new();
        store.update_story_from_gm(&GmPayload {
            narration: "Lost".to_string(),
            public_hints: vec![],
            private_hints: None,
        });
        assert!(store.snapshot().story_state.is_none());
    }

    #[test]
    fn patch_story_flags_never_synthesizes() {
        let store = GameStore::new();
        store.set_session_ref("s1".to_string(), None);
        store.patch_story_flags([("openedDoorA".to_string(), FlagValue::Bool(true))]);
        assert!(store.snapshot().story_state.is_none());

        store.set_story_state(Some(StoryState::empty("s1", 1)));
        store.patch_story_flags([("openedDoorA".to_string(), FlagValue::Bool(true))]);
        let story = store.snapshot().story_state.unwrap();
        assert_eq!(story.flags["openedDoorA"], FlagValue::Bool(true));
    }

    #[test]
    fn gm_chunk_buffer_pushes_and_resets() {
        let store = GameStore::new();
        store.push_gm_chunk("one");
        store.push_gm_chunk("two");
        assert_eq!(store.snapshot().gm_stream, vec!["one", "two"]);

        store.reset_gm_stream();
        assert!(store.snapshot().gm_stream.is_empty());
    }

    #[test]
    fn reset_keeps_the_caller_identity() {
        let store = GameStore::new();
        store.set_player_id(Some("u1".to_string()));
        store.set_session(Some(make_session("u1")), None);
        store.push_gm_chunk("one");

        store.reset();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.player_id.as_deref(), Some("u1"));
        assert!(snapshot.session.is_none());
        assert!(snapshot.session_id.is_none());
        assert!(snapshot.gm_stream.is_empty());
        assert!(!snapshot.is_owner);
    }

    #[test]
    fn only_the_session_ref_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = GameStore::new();
        store.set_player_id(Some("u1".to_string()));
        store.set_session(Some(make_session("u1")), None);
        store.set_players(vec![]);
        store.save(&path).unwrap();

        let persisted = GameStore::load(&path).unwrap().unwrap();
        assert_eq!(persisted.session_id.as_deref(), Some("s1"));
        assert_eq!(persisted.session_code.as_deref(), Some("ABC234"));

        let restored = GameStore::new();
        restored.restore(persisted);
        let snapshot = restored.snapshot();
        assert_eq!(snapshot.session_id.as_deref(), Some("s1"));
        assert!(snapshot.session.is_none());
        assert!(snapshot.player_id.is_none());
    }

    #[test]
    fn missing_or_corrupt_persistence_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(GameStore::load(&missing).unwrap().is_none());

        let corrupt = dir.path().join("bad.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        assert!(GameStore::load(&corrupt).unwrap().is_none());
    }

    #[tokio::test]
    async fn watchers_observe_updates() {
        let store = GameStore::new();
        let mut rx = store.subscribe();

        store.set_session_ref("s1".to_string(), None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().session_id.as_deref(), Some("s1"));
    }
}
