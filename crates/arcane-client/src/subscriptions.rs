// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live subscription aggregator.
//!
//! For one session, four independent subscriptions (session document,
//! players ordered by join time, messages ordered by creation time, story
//! state) each run as their own task over the store change feed: initial
//! load, then a re-read of current state on every matching notification.
//! Events carry no payload, so a lagged feed only delays a refresh.
//!
//! Every raw document is decoded against its schema; a record that fails
//! decoding is dropped from the result set rather than corrupting the
//! snapshot. All four tasks share one cancellation token and are torn down
//! together — tearing down a subset would leak stale updates.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use arcane_core::code::CODE_LENGTH;
use arcane_core::{Message, Player, Session, StoryState};
use arcane_store::{Collection, DocumentStore};

use crate::state::GameStore;

/// Handle owning the four subscription tasks for one session.
pub struct SubscriptionAggregator {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SubscriptionAggregator {
    /// Establishes all four subscriptions for `session_id`, folding every
    /// update into `game`.
    pub fn spawn(
        store: Arc<DocumentStore>,
        session_id: impl Into<String>,
        game: Arc<GameStore>,
    ) -> Self {
        let session_id = session_id.into();
        let cancel = CancellationToken::new();

        let tasks = [
            Collection::Sessions,
            Collection::Players,
            Collection::Messages,
            Collection::StoryStates,
        ]
        .into_iter()
        .map(|collection| {
            tokio::spawn(run_subscription(
                collection,
                Arc::clone(&store),
                session_id.clone(),
                Arc::clone(&game),
                cancel.clone(),
            ))
        })
        .collect();

        Self { cancel, tasks }
    }

    /// Tears down all four subscriptions together.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            let _ = task.await;
        }
    }
}

impl Drop for SubscriptionAggregator {
    fn drop(&mut self) {
        // Dropping the handle must not leave subscriptions running.
        self.cancel.cancel();
    }
}

/// One subscription: initial load, then refresh on matching change events.
async fn run_subscription(
    collection: Collection,
    store: Arc<DocumentStore>,
    session_id: String,
    game: Arc<GameStore>,
    cancel: CancellationToken,
) {
    let mut changes = store.subscribe();
    refresh(collection, &store, &session_id, &game).await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = changes.recv() => match event {
                Ok(event) => {
                    if event.collection == collection && event.session_id == session_id {
                        refresh(collection, &store, &session_id, &game).await;
                    }
                }
                // Missed notifications: current state is re-read anyway.
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(?collection, skipped, "change feed lagged, refreshing");
                    refresh(collection, &store, &session_id, &game).await;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

async fn refresh(
    collection: Collection,
    store: &DocumentStore,
    session_id: &str,
    game: &GameStore,
) {
    match collection {
        Collection::Sessions => match store.get_session(session_id).await {
            Ok(Some(doc)) => {
                if let Some(session) = decode_session(doc) {
                    game.set_session(Some(session), None);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "session refresh failed"),
        },
        Collection::Players => match store.players_for_session(session_id).await {
            Ok(docs) => {
                let players = docs.into_iter().filter_map(decode_player).collect();
                game.set_players(players);
            }
            Err(e) => tracing::warn!(error = %e, "player refresh failed"),
        },
        Collection::Messages => match store.messages_for_session(session_id).await {
            Ok(docs) => {
                let messages = docs.into_iter().filter_map(decode_message).collect();
                game.set_messages(messages);
            }
            Err(e) => tracing::warn!(error = %e, "message refresh failed"),
        },
        Collection::StoryStates => match store.get_story_state(session_id).await {
            Ok(Some(doc)) => {
                if let Some(story) = decode_story(doc) {
                    game.set_story_state(Some(story));
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "story refresh failed"),
        },
    }
}

// Decode-or-drop: schema failures return None and the record vanishes from
// the snapshot instead of breaking the feed.

fn decode_session(doc: Value) -> Option<Session> {
    let session: Session = serde_json::from_value(doc).ok()?;
    (session.code.chars().count() == CODE_LENGTH).then_some(session)
}

fn decode_player(doc: Value) -> Option<Player> {
    let player: Player = serde_json::from_value(doc).ok()?;
    let name_len = player.display_name.chars().count();
    ((1..=50).contains(&name_len)).then_some(player)
}

fn decode_message(doc: Value) -> Option<Message> {
    let message: Message = serde_json::from_value(doc).ok()?;
    let text_len = message.text.chars().count();
    ((1..=2000).contains(&text_len)).then_some(message)
}

fn decode_story(doc: Value) -> Option<StoryState> {
    serde_json::from_value(doc).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcane_core::{SessionStatus, player_doc_id};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    async fn setup() -> (Arc<DocumentStore>, Arc<GameStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = DocumentStore::open(db_path.to_str().unwrap()).await.unwrap();
        (Arc::new(store), Arc::new(GameStore::new()), dir)
    }

    fn make_player(session_id: &str, user_id: &str, name: &str, joined_at: i64) -> Player {
        Player {
            id: player_doc_id(session_id, user_id),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            display_name: name.to_string(),
            is_owner: false,
            joined_at,
        }
    }

    async fn wait_until(game: &GameStore, predicate: impl Fn(&crate::state::GameSnapshot) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if predicate(&game.snapshot()) {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "aggregator never reached expected state"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[test]
    fn malformed_player_is_dropped() {
        assert!(decode_player(json!({
            "id": "s1_u1",
            "sessionId": "s1",
            "userId": "u1",
            "isOwner": false,
            "joinedAt": 1,
        }))
        .is_none());
    }

    #[test]
    fn player_with_native_timestamp_decodes() {
        let player = decode_player(json!({
            "id": "s1_u1",
            "sessionId": "s1",
            "userId": "u1",
            "displayName": "Mira",
            "isOwner": false,
            "joinedAt": {"seconds": 2, "nanos": 0},
        }))
        .unwrap();
        assert_eq!(player.joined_at, 2_000);
    }

    #[test]
    fn overlong_message_is_dropped() {
        assert!(decode_message(json!({
            "id": "m1",
            "sessionId": "s1",
            "author": "player",
            "playerId": "u1",
            "text": "x".repeat(2001),
            "createdAt": 1,
        }))
        .is_none());
    }

    #[tokio::test]
    async fn malformed_player_among_valid_ones_shrinks_the_list() {
        let (store, game, _dir) = setup().await;

        store.upsert_player(&make_player("s1", "u1", "First", 1)).await.unwrap();
        store.upsert_player(&make_player("s1", "u2", "Second", 2)).await.unwrap();
        // A partially-written document with no displayName.
        store
            .database()
            .connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO players (id, session_id, joined_at, body) VALUES
                     ('s1_u3', 's1', 3, '{\"id\":\"s1_u3\",\"sessionId\":\"s1\",\"userId\":\"u3\",\"isOwner\":false,\"joinedAt\":3}')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let aggregator =
            SubscriptionAggregator::spawn(Arc::clone(&store), "s1", Arc::clone(&game));
        wait_until(&game, |s| s.players.len() == 2).await;

        let snapshot = game.snapshot();
        assert_eq!(snapshot.players[0].display_name, "First");
        assert_eq!(snapshot.players[1].display_name, "Second");

        aggregator.shutdown().await;
    }

    #[tokio::test]
    async fn updates_flow_into_the_snapshot() {
        let (store, game, _dir) = setup().await;
        store
            .create_session(&Session {
                id: "s1".to_string(),
                code: "ABC234".to_string(),
                status: SessionStatus::Lobby,
                owner_id: "u1".to_string(),
                created_at: Some(1),
            })
            .await
            .unwrap();

        let aggregator =
            SubscriptionAggregator::spawn(Arc::clone(&store), "s1", Arc::clone(&game));
        wait_until(&game, |s| s.session.is_some()).await;

        // A later status change propagates.
        store
            .merge_session("s1", json!({"status": "active"}))
            .await
            .unwrap();
        wait_until(&game, |s| {
            s.session.as_ref().is_some_and(|sess| sess.status == SessionStatus::Active)
        })
        .await;

        // Story-state merges propagate too.
        store
            .merge_story_state("s1", json!({"narration": "It begins."}))
            .await
            .unwrap();
        wait_until(&game, |s| {
            s.story_state.as_ref().is_some_and(|st| st.narration == "It begins.")
        })
        .await;

        aggregator.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_all_four_feeds() {
        let (store, game, _dir) = setup().await;
        let aggregator =
            SubscriptionAggregator::spawn(Arc::clone(&store), "s1", Arc::clone(&game));
        aggregator.shutdown().await;

        // A write after teardown never reaches the snapshot.
        store.upsert_player(&make_player("s1", "u1", "Late", 1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(game.snapshot().players.is_empty());
    }
}
