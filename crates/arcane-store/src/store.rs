// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The document store gateway.
//!
//! [`DocumentStore`] bundles the single-writer database with a broadcast
//! change feed: every committed write publishes a [`ChangeEvent`] naming
//! the collection and session it touched. Live subscribers react by
//! re-reading current state — events carry no payload, so a lagged or
//! dropped notification can never corrupt a reader, only delay it.

use arcane_core::{ArcaneError, Message, Player, Session, StoryState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::database::Database;
use crate::queries;

/// Capacity of the change feed; slow subscribers lag and re-query.
const CHANGE_FEED_CAPACITY: usize = 256;

/// The four document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Sessions,
    Players,
    Messages,
    StoryStates,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Sessions => "sessions",
            Collection::Players => "players",
            Collection::Messages => "messages",
            Collection::StoryStates => "storyStates",
        }
    }
}

/// A change notification: something in `collection` changed for `session_id`.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub session_id: String,
}

/// Decode a raw document into a typed value.
///
/// Server-side use only: documents read back by command handlers were
/// written by this process, so a decode failure is an internal fault, not
/// caller error.
pub fn decode_document<T: DeserializeOwned>(doc: Value) -> Result<T, ArcaneError> {
    serde_json::from_value(doc).map_err(|e| ArcaneError::Storage {
        source: Box::new(e),
    })
}

/// Gateway over the four collections: create/read/merge/query plus a
/// broadcast change feed for live subscriptions.
pub struct DocumentStore {
    db: Database,
    changes: broadcast::Sender<ChangeEvent>,
}

impl DocumentStore {
    /// Opens the store at `path`, running migrations.
    pub async fn open(path: &str) -> Result<Self, ArcaneError> {
        let db = Database::open(path).await?;
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Ok(Self { db, changes })
    }

    /// Subscribe to the change feed.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// The underlying single-writer database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn notify(&self, collection: Collection, session_id: &str) {
        tracing::trace!(collection = collection.as_str(), session_id, "document changed");
        // No receivers is fine: nobody is watching this process yet.
        let _ = self.changes.send(ChangeEvent {
            collection,
            session_id: session_id.to_string(),
        });
    }

    // --- sessions ---

    pub async fn create_session(&self, session: &Session) -> Result<(), ArcaneError> {
        queries::sessions::create_session(&self.db, session).await?;
        self.notify(Collection::Sessions, &session.id);
        Ok(())
    }

    pub async fn get_session(&self, id: &str) -> Result<Option<Value>, ArcaneError> {
        queries::sessions::get_session(&self.db, id).await
    }

    pub async fn find_session_by_code(&self, code: &str) -> Result<Option<Value>, ArcaneError> {
        queries::sessions::find_session_by_code(&self.db, code).await
    }

    /// Field-level merge; silently a no-op when the session is absent.
    pub async fn merge_session(&self, id: &str, patch: Value) -> Result<(), ArcaneError> {
        if queries::sessions::merge_session(&self.db, id, patch).await? {
            self.notify(Collection::Sessions, id);
        }
        Ok(())
    }

    // --- players ---

    pub async fn upsert_player(&self, player: &Player) -> Result<(), ArcaneError> {
        queries::players::upsert_player(&self.db, player).await?;
        self.notify(Collection::Players, &player.session_id);
        Ok(())
    }

    pub async fn players_for_session(&self, session_id: &str) -> Result<Vec<Value>, ArcaneError> {
        queries::players::players_for_session(&self.db, session_id).await
    }

    // --- messages ---

    pub async fn append_message(&self, message: &Message) -> Result<(), ArcaneError> {
        queries::messages::append_message(&self.db, message).await?;
        self.notify(Collection::Messages, &message.session_id);
        Ok(())
    }

    pub async fn messages_for_session(&self, session_id: &str) -> Result<Vec<Value>, ArcaneError> {
        queries::messages::messages_for_session(&self.db, session_id).await
    }

    // --- story states ---

    pub async fn create_story_state(&self, story: &StoryState) -> Result<(), ArcaneError> {
        queries::story::create_story_state(&self.db, story).await?;
        self.notify(Collection::StoryStates, &story.session_id);
        Ok(())
    }

    pub async fn get_story_state(&self, session_id: &str) -> Result<Option<Value>, ArcaneError> {
        queries::story::get_story_state(&self.db, session_id).await
    }

    pub async fn merge_story_state(
        &self,
        session_id: &str,
        patch: Value,
    ) -> Result<(), ArcaneError> {
        queries::story::merge_story_state(&self.db, session_id, patch).await?;
        self.notify(Collection::StoryStates, session_id);
        Ok(())
    }

    /// Closes the underlying database.
    pub async fn close(self) -> Result<(), ArcaneError> {
        self.db.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcane_core::SessionStatus;
    use tempfile::tempdir;

    async fn setup_store() -> (DocumentStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = DocumentStore::open(db_path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }

    fn make_session(id: &str, code: &str) -> Session {
        Session {
            id: id.to_string(),
            code: code.to_string(),
            status: SessionStatus::Lobby,
            owner_id: "owner-1".to_string(),
            created_at: Some(1),
        }
    }

    #[tokio::test]
    async fn writes_publish_change_events() {
        let (store, _dir) = setup_store().await;
        let mut feed = store.subscribe();

        store.create_session(&make_session("s1", "ABC234")).await.unwrap();
        let event = feed.recv().await.unwrap();
        assert_eq!(event.collection, Collection::Sessions);
        assert_eq!(event.session_id, "s1");

        store
            .merge_story_state("s1", serde_json::json!({"narration": "x"}))
            .await
            .unwrap();
        let event = feed.recv().await.unwrap();
        assert_eq!(event.collection, Collection::StoryStates);
        assert_eq!(event.session_id, "s1");
    }

    #[tokio::test]
    async fn merge_on_missing_session_publishes_nothing() {
        let (store, _dir) = setup_store().await;
        let mut feed = store.subscribe();

        store
            .merge_session("ghost", serde_json::json!({"status": "active"}))
            .await
            .unwrap();

        // No event queued.
        assert!(matches!(
            feed.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn writes_succeed_without_subscribers() {
        let (store, _dir) = setup_store().await;
        store.create_session(&make_session("s1", "ABC234")).await.unwrap();
        assert!(store.get_session("s1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn decode_document_maps_errors_to_storage() {
        let doc = serde_json::json!({"id": "s1"});
        let result = decode_document::<Session>(doc);
        assert!(matches!(result, Err(ArcaneError::Storage { .. })));
    }
}
