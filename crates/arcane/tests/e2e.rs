// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete Arcane Relay pipeline.
//!
//! Each test creates an isolated TestHarness with a temp SQLite store and
//! a live server on an ephemeral port. Tests are independent and
//! order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use arcane_client::{GameStore, SubscriptionAggregator};
use arcane_core::ArcaneError;
use arcane_core::code::is_valid_code;
use arcane_server::RatePolicy;
use arcane_test_utils::TestHarness;

// ---- Command flow ----

#[tokio::test]
async fn create_join_start_message_puzzle_flow() {
    let harness = TestHarness::builder().build().await.unwrap();

    let (owner, owner_id) = harness.signed_in_client().await.unwrap();
    let created = owner.create_session("Game Master").await.unwrap();
    assert!(is_valid_code(&created.code));

    // Creation wrote the session, the owner player, and an empty story state.
    let session_doc = harness.store.get_session(&created.session_id).await.unwrap().unwrap();
    assert_eq!(session_doc["status"], "lobby");
    assert_eq!(session_doc["ownerId"], owner_id);
    let story_doc = harness
        .store
        .get_story_state(&created.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(story_doc["narration"], "");

    // A second player joins by code.
    let (player, player_id) = harness.signed_in_client().await.unwrap();
    let joined = player.join_session(&created.code, "Mira").await.unwrap();
    assert_eq!(joined.session_id, created.session_id);

    let players = harness
        .store
        .players_for_session(&created.session_id)
        .await
        .unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["userId"], owner_id);
    assert_eq!(players[0]["isOwner"], true);
    assert_eq!(players[1]["userId"], player_id);
    assert_eq!(players[1]["isOwner"], false);

    // Owner starts the session.
    owner.start_session(&created.session_id).await.unwrap();
    let session_doc = harness.store.get_session(&created.session_id).await.unwrap().unwrap();
    assert_eq!(session_doc["status"], "active");

    // Starting again is an idempotent no-op.
    owner.start_session(&created.session_id).await.unwrap();

    // Chat.
    player.send_message(&created.session_id, "hello table").await.unwrap();
    let messages = harness
        .store
        .messages_for_session(&created.session_id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "hello table");
    assert_eq!(messages[0]["author"], "player");
    assert_eq!(messages[0]["playerId"], player_id);

    // Wrong answer leaves the flags untouched.
    assert!(!player.validate_puzzle(&created.session_id, "wrong").await.unwrap());
    let story_doc = harness
        .store
        .get_story_state(&created.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(story_doc["flags"].as_object().unwrap().is_empty());

    // Correct answer (case/whitespace-insensitive) sets openedDoorA.
    assert!(
        player
            .validate_puzzle(&created.session_id, "  tri-CIRCLE-square ")
            .await
            .unwrap()
    );
    let story_doc = harness
        .store
        .get_story_state(&created.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(story_doc["flags"]["openedDoorA"], true);
}

#[tokio::test]
async fn join_is_idempotent_and_updates_display_name() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (owner, _) = harness.signed_in_client().await.unwrap();
    let created = owner.create_session("Game Master").await.unwrap();

    let (player, _) = harness.signed_in_client().await.unwrap();
    player.join_session(&created.code, "Mira").await.unwrap();
    player.join_session(&created.code, "Mirabel").await.unwrap();

    let players = harness
        .store
        .players_for_session(&created.session_id)
        .await
        .unwrap();
    // Owner plus exactly one joined player, carrying the latest name.
    assert_eq!(players.len(), 2);
    assert_eq!(players[1]["displayName"], "Mirabel");
}

// ---- Error taxonomy over the wire ----

#[tokio::test]
async fn commands_require_authentication() {
    let harness = TestHarness::builder().build().await.unwrap();
    let anonymous = harness.client().unwrap();

    let err = anonymous.create_session("Nobody").await.unwrap_err();
    assert!(matches!(err, ArcaneError::Unauthenticated));

    let forged = harness.client().unwrap().with_token("u1.deadbeef");
    let err = forged.create_session("Forger").await.unwrap_err();
    assert!(matches!(err, ArcaneError::Unauthenticated));
}

#[tokio::test]
async fn joining_an_unknown_code_is_not_found() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (client, _) = harness.signed_in_client().await.unwrap();

    let err = client.join_session("ZZZZ99", "Mira").await.unwrap_err();
    assert!(matches!(err, ArcaneError::NotFound(_)));
}

#[tokio::test]
async fn only_the_owner_may_start() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (owner, _) = harness.signed_in_client().await.unwrap();
    let created = owner.create_session("Game Master").await.unwrap();

    let (player, _) = harness.signed_in_client().await.unwrap();
    player.join_session(&created.code, "Mira").await.unwrap();

    let err = player.start_session(&created.session_id).await.unwrap_err();
    assert!(matches!(err, ArcaneError::PermissionDenied(_)));

    // The session is still in the lobby.
    let doc = harness.store.get_session(&created.session_id).await.unwrap().unwrap();
    assert_eq!(doc["status"], "lobby");
}

#[tokio::test]
async fn command_rate_limit_is_enforced_per_caller() {
    let harness = TestHarness::builder()
        .with_command_policy(RatePolicy::per_window(2, Duration::from_secs(60)))
        .build()
        .await
        .unwrap();

    let (client, _) = harness.signed_in_client().await.unwrap();
    // Sign-in consumed nothing for this identity: commands key on user id.
    client.create_session("One").await.unwrap();
    client.create_session("Two").await.unwrap();
    let err = client.create_session("Three").await.unwrap_err();
    assert!(matches!(err, ArcaneError::ResourceExhausted));
}

// ---- Narration stream ----

#[tokio::test]
async fn gm_stream_requires_a_session_id() {
    let harness = TestHarness::builder().build().await.unwrap();

    let response = reqwest::get(format!("{}/v1/gm/stream", harness.base_url))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "invalid-argument");
}

#[tokio::test]
async fn gm_stream_feeds_chunks_payload_and_persists() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (owner, _) = harness.signed_in_client().await.unwrap();
    let created = owner.create_session("Game Master").await.unwrap();

    let (chunk_tx, mut chunk_rx) = tokio::sync::mpsc::unbounded_channel();
    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = arcane_client::connect(
        &harness.base_url,
        &created.session_id,
        move |chunk| {
            let _ = chunk_tx.send(chunk.to_string());
        },
        move |payload| {
            let _ = done_tx.send(payload);
        },
    )
    .unwrap();
    handle.join().await;

    assert_eq!(chunk_rx.recv().await.unwrap(), "chunk1");
    assert_eq!(chunk_rx.recv().await.unwrap(), "chunk2");

    let payload = done_rx.recv().await.unwrap();
    assert_eq!(payload.narration, "The door shudders.");
    assert_eq!(payload.public_hints, vec!["The order of the symbols matters"]);

    // The same state was merged server-side before the stream closed.
    let story_doc = harness
        .store
        .get_story_state(&created.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(story_doc["narration"], "The door shudders.");
}

// ---- Live subscriptions feeding the client state store ----

#[tokio::test]
async fn subscriptions_fold_command_effects_into_client_state() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (owner, owner_id) = harness.signed_in_client().await.unwrap();
    let created = owner.create_session("Game Master").await.unwrap();

    let game = Arc::new(GameStore::new());
    game.set_player_id(Some(owner_id));
    game.set_session_ref(created.session_id.clone(), Some(created.code.clone()));

    let aggregator = SubscriptionAggregator::spawn(
        Arc::clone(&harness.store),
        created.session_id.clone(),
        Arc::clone(&game),
    );

    // The session document arrives and derived ownership flips on.
    wait_until(&game, |s| s.session.is_some()).await;
    assert!(game.snapshot().is_owner);

    owner.send_message(&created.session_id, "welcome!").await.unwrap();
    wait_until(&game, |s| s.messages.len() == 1).await;
    assert_eq!(game.snapshot().messages[0].text, "welcome!");

    owner
        .validate_puzzle(&created.session_id, "tri-circle-square")
        .await
        .unwrap();
    wait_until(&game, |s| {
        s.story_state
            .as_ref()
            .is_some_and(|story| story.flags.contains_key("openedDoorA"))
    })
    .await;

    aggregator.shutdown().await;
}

async fn wait_until(
    game: &arcane_client::GameStore,
    predicate: impl Fn(&arcane_client::GameSnapshot) -> bool,
) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if predicate(&game.snapshot()) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "state never reached expected shape"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
