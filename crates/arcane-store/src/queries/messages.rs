// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message document operations. Append-only.

use arcane_core::{ArcaneError, Message};
use rusqlite::params;
use serde_json::Value;

use crate::database::{Database, map_tr_err};

/// Append a new message document.
pub async fn append_message(db: &Database, message: &Message) -> Result<(), ArcaneError> {
    let body = serde_json::to_string(message).map_err(|e| ArcaneError::Storage {
        source: Box::new(e),
    })?;
    let id = message.id.clone();
    let session_id = message.session_id.clone();
    let created_at = message.created_at;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, session_id, created_at, body) VALUES (?1, ?2, ?3, ?4)",
                params![id, session_id, created_at, body],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Message documents for a session in chronological order.
pub async fn messages_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<Value>, ArcaneError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT body FROM messages WHERE session_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![session_id], |row| row.get::<_, String>(0))?;
            let mut docs = Vec::new();
            for row in rows {
                let text = row?;
                match serde_json::from_str(&text) {
                    Ok(value) => docs.push(value),
                    Err(e) => tracing::warn!(error = %e, "skipping unparseable message document"),
                }
            }
            Ok(docs)
        })
        .await
        .map_err(map_tr_err)
}
