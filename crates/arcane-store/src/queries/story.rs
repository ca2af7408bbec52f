// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Story-state document operations. One document per session.

use arcane_core::{ArcaneError, StoryState};
use rusqlite::params;
use serde_json::Value;

use crate::database::{Database, map_tr_err, other_err};
use crate::merge::merge_document;

/// Insert the empty story state created alongside a new session.
pub async fn create_story_state(db: &Database, story: &StoryState) -> Result<(), ArcaneError> {
    let body = serde_json::to_string(story).map_err(|e| ArcaneError::Storage {
        source: Box::new(e),
    })?;
    let session_id = story.session_id.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO story_states (session_id, body) VALUES (?1, ?2)",
                params![session_id, body],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get the story-state document for a session.
pub async fn get_story_state(
    db: &Database,
    session_id: &str,
) -> Result<Option<Value>, ArcaneError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT body FROM story_states WHERE session_id = ?1",
                params![session_id],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(text) => {
                    let value = serde_json::from_str(&text).map_err(other_err)?;
                    Ok(Some(value))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Field-level merge into a session's story state.
///
/// Creates the document from the patch when none exists (set-with-merge),
/// so a crash that skipped story-state creation does not wedge the session.
pub async fn merge_story_state(
    db: &Database,
    session_id: &str,
    patch: Value,
) -> Result<(), ArcaneError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let body = match tx.query_row(
                "SELECT body FROM story_states WHERE session_id = ?1",
                params![session_id],
                |row| row.get::<_, String>(0),
            ) {
                Ok(text) => {
                    let mut base: Value = serde_json::from_str(&text).map_err(other_err)?;
                    merge_document(&mut base, &patch);
                    base
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    let mut base = serde_json::json!({"sessionId": session_id});
                    merge_document(&mut base, &patch);
                    base
                }
                Err(e) => return Err(e.into()),
            };
            let text = serde_json::to_string(&body).map_err(other_err)?;
            tx.execute(
                "INSERT INTO story_states (session_id, body) VALUES (?1, ?2)
                 ON CONFLICT(session_id) DO UPDATE SET body = excluded.body",
                params![session_id, text],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
