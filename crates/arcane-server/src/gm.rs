// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GM narration stream endpoint.
//!
//! `GET /v1/gm/stream?sessionId=...` returns a Server-Sent Events stream:
//! an ordered sequence of narration fragments, then one event carrying the
//! JSON final payload, then the literal sentinel `[DONE]`. Immediately
//! before the final payload event, the narration and public hints are
//! merged into the session's story state so subscribers converge to the
//! state the stream just announced.
//!
//! The stream is pull-driven: when the caller disconnects, the stream is
//! dropped and never polled again, so no further fragments are emitted and
//! the story-state merge does not happen unless the stream reached it.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Query, State},
    response::sse::{Event, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use arcane_core::time::now_millis;
use arcane_core::{ArcaneError, DONE_SENTINEL};
use arcane_store::DocumentStore;

use crate::handlers::ApiError;
use crate::server::AppState;

/// The scene script a narration stream plays out.
#[derive(Debug, Clone)]
pub struct GmScript {
    /// Fragments emitted in order before the final payload.
    pub chunks: Vec<String>,
    /// Final narration text, merged into the story state.
    pub narration: String,
    /// Public hints merged alongside the narration.
    pub public_hints: Vec<String>,
    /// Pause between fragments (simulated generation latency).
    pub chunk_delay: Duration,
}

/// Query parameters for the stream endpoint.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Where the stream is in one scene: emitting ordered fragments (the final
/// payload follows the last one), then the sentinel, then closed.
enum StreamPhase {
    Fragment(usize),
    Sentinel,
    Closed,
}

/// GET /v1/gm/stream
pub async fn gm_stream(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(params): Query<StreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // No identity on this endpoint; throttle by peer address.
    state
        .limiter
        .check(&addr.ip().to_string(), state.command_policy)?;

    let Some(session_id) = params.session_id.filter(|s| !s.is_empty()) else {
        return Err(ArcaneError::InvalidArgument("sessionId is required".to_string()).into());
    };

    let events = scene_events(state.store.clone(), state.gm.clone(), session_id)
        .map(|data| Ok(Event::default().data(data)));
    Ok(Sse::new(events))
}

/// The raw event data sequence for one scene: each fragment, the JSON final
/// payload, then the sentinel. Persists the narration merge immediately
/// before yielding the final payload.
fn scene_events(
    store: Arc<DocumentStore>,
    script: Arc<GmScript>,
    session_id: String,
) -> impl Stream<Item = String> {
    stream::unfold(StreamPhase::Fragment(0), move |phase| {
        let store = Arc::clone(&store);
        let script = Arc::clone(&script);
        let session_id = session_id.clone();
        async move {
            match phase {
                StreamPhase::Fragment(index) if index < script.chunks.len() => {
                    if index > 0 {
                        tokio::time::sleep(script.chunk_delay).await;
                    }
                    Some((script.chunks[index].clone(), StreamPhase::Fragment(index + 1)))
                }
                StreamPhase::Fragment(_) => {
                    if !script.chunks.is_empty() {
                        tokio::time::sleep(script.chunk_delay).await;
                    }

                    let patch = serde_json::json!({
                        "narration": script.narration,
                        "publicHints": script.public_hints,
                        "updatedAt": now_millis(),
                    });
                    if let Err(e) = store.merge_story_state(&session_id, patch).await {
                        tracing::error!(
                            error = %e,
                            session_id = %session_id,
                            "failed to persist narration"
                        );
                    }

                    let payload = serde_json::json!({
                        "narration": script.narration,
                        "publicHints": script.public_hints,
                        "privateHints": {},
                    });
                    Some((payload.to_string(), StreamPhase::Sentinel))
                }
                StreamPhase::Sentinel => {
                    Some((DONE_SENTINEL.to_string(), StreamPhase::Closed))
                }
                StreamPhase::Closed => None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcane_core::GmPayload;
    use tempfile::tempdir;

    fn test_script() -> Arc<GmScript> {
        Arc::new(GmScript {
            chunks: vec!["chunk1".to_string(), "chunk2".to_string()],
            narration: "The door shudders.".to_string(),
            public_hints: vec!["The order matters".to_string()],
            chunk_delay: Duration::ZERO,
        })
    }

    async fn setup_store() -> (Arc<DocumentStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = DocumentStore::open(db_path.to_str().unwrap()).await.unwrap();
        (Arc::new(store), dir)
    }

    #[tokio::test]
    async fn events_are_fragments_then_payload_then_sentinel() {
        let (store, _dir) = setup_store().await;
        let events: Vec<String> =
            scene_events(store, test_script(), "s1".to_string()).collect().await;

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], "chunk1");
        assert_eq!(events[1], "chunk2");
        let payload: GmPayload = serde_json::from_str(&events[2]).unwrap();
        assert_eq!(payload.narration, "The door shudders.");
        assert_eq!(payload.public_hints, vec!["The order matters"]);
        assert_eq!(events[3], DONE_SENTINEL);
    }

    #[tokio::test]
    async fn narration_is_persisted_before_final_payload() {
        let (store, _dir) = setup_store().await;
        let mut events = Box::pin(scene_events(
            Arc::clone(&store),
            test_script(),
            "s1".to_string(),
        ));

        // Consume the two fragments; nothing persisted yet.
        events.next().await.unwrap();
        events.next().await.unwrap();
        assert!(store.get_story_state("s1").await.unwrap().is_none());

        // The final payload event carries the same state the merge wrote.
        let payload_event = events.next().await.unwrap();
        let doc = store.get_story_state("s1").await.unwrap().unwrap();
        assert_eq!(doc["narration"], "The door shudders.");
        let payload: GmPayload = serde_json::from_str(&payload_event).unwrap();
        assert_eq!(payload.narration, doc["narration"].as_str().unwrap());
    }

    #[tokio::test]
    async fn dropped_stream_stops_before_side_effects() {
        let (store, _dir) = setup_store().await;
        let mut events = Box::pin(scene_events(
            Arc::clone(&store),
            test_script(),
            "s1".to_string(),
        ));

        // Caller disconnects after the first fragment.
        events.next().await.unwrap();
        drop(events);

        assert!(store.get_story_state("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_chunk_script_still_emits_payload_and_sentinel() {
        let (store, _dir) = setup_store().await;
        let script = Arc::new(GmScript {
            chunks: Vec::new(),
            narration: "Silence.".to_string(),
            public_hints: Vec::new(),
            chunk_delay: Duration::ZERO,
        });
        let events: Vec<String> =
            scene_events(store, script, "s1".to_string()).collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], DONE_SENTINEL);
    }
}
