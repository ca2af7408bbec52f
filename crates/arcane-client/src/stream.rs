// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GM narration stream consumer.
//!
//! Connects to the narration SSE endpoint, buffers fragments for
//! incremental display, and on the `[DONE]` sentinel parses the final
//! structured payload. The payload parse first tries the accumulated
//! buffer (a payload may arrive split across events), then the last event
//! datum; if neither parses, the stream closes without invoking `on_done`
//! and the caller treats completion without a callback as a soft failure.
//!
//! One stream is active per scene transition: [`GmStreamController`]
//! aborts the previous stream and resets buffered state before starting a
//! new one.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use arcane_core::{ArcaneError, DONE_SENTINEL, GmPayload};

use crate::state::GameStore;

/// Cancellation handle for an in-flight narration stream.
#[derive(Debug)]
pub struct GmStreamHandle {
    task: JoinHandle<()>,
}

impl GmStreamHandle {
    /// Stops consuming: the transport drops and no further callbacks fire.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Whether the stream has finished (sentinel, transport error, or abort).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the consumer task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Opens the narration stream for `session_id`.
///
/// `on_chunk` fires once per fragment in arrival order; `on_done` fires at
/// most once, with the parsed final payload. The underlying connection is
/// closed when the task ends, on sentinel and transport error alike.
pub fn connect(
    base_url: &str,
    session_id: &str,
    mut on_chunk: impl FnMut(&str) + Send + 'static,
    on_done: impl FnOnce(GmPayload) + Send + 'static,
) -> Result<GmStreamHandle, ArcaneError> {
    let url = format!(
        "{}/v1/gm/stream?sessionId={}",
        base_url.trim_end_matches('/'),
        session_id
    );

    let task = tokio::spawn(async move {
        let response = match reqwest::get(&url).await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "gm stream request rejected");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "gm stream connection failed");
                return;
            }
        };

        let mut events = response.bytes_stream().eventsource();
        let mut buffer = String::new();
        let mut last_datum = String::new();
        let mut on_done = Some(on_done);

        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if event.data == DONE_SENTINEL {
                        match parse_payload(&buffer, &last_datum) {
                            Some(payload) => {
                                if let Some(callback) = on_done.take() {
                                    callback(payload);
                                }
                            }
                            None => {
                                tracing::error!("failed to parse GM payload");
                            }
                        }
                        break;
                    }
                    buffer.push_str(&event.data);
                    on_chunk(&event.data);
                    last_datum = event.data;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "gm stream transport error");
                    break;
                }
            }
        }
        // Dropping `events` here closes the connection exactly once.
    });

    Ok(GmStreamHandle { task })
}

fn parse_payload(buffer: &str, last_datum: &str) -> Option<GmPayload> {
    serde_json::from_str(buffer)
        .or_else(|_| serde_json::from_str(last_datum))
        .ok()
}

/// Owns the single active narration stream for a client.
///
/// Starting a new stream aborts the previous one and clears the game
/// store's chunk buffer first, so a retried scene starts from fresh state.
#[derive(Debug, Default)]
pub struct GmStreamController {
    active: Mutex<Option<GmStreamHandle>>,
}

impl GmStreamController {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    /// Starts the narration stream for `session_id`, wiring fragments and
    /// the final payload into `game`.
    pub async fn start(
        &self,
        base_url: &str,
        session_id: &str,
        game: std::sync::Arc<GameStore>,
    ) -> Result<(), ArcaneError> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.abort();
        }
        game.reset_gm_stream();

        let chunk_store = std::sync::Arc::clone(&game);
        let handle = connect(
            base_url,
            session_id,
            move |chunk| chunk_store.push_gm_chunk(chunk),
            move |payload| game.update_story_from_gm(&payload),
        )?;
        *active = Some(handle);
        Ok(())
    }

    /// Stops the active stream, if any.
    pub async fn stop(&self) {
        if let Some(handle) = self.active.lock().await.take() {
            handle.abort();
        }
    }
}
