// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Player document operations.
//!
//! Player documents are keyed `"{sessionId}_{userId}"`, so writing the same
//! (session, user) pair merges into one record instead of duplicating it.

use arcane_core::{ArcaneError, Player};
use rusqlite::params;
use serde_json::Value;

use crate::database::{Database, map_tr_err, other_err};
use crate::merge::merge_document;

/// Merge-upsert a player document.
///
/// A re-join overwrites the fields it carries (display name, joinedAt,
/// ownership) and preserves anything else already in the document.
pub async fn upsert_player(db: &Database, player: &Player) -> Result<(), ArcaneError> {
    let patch = serde_json::to_value(player).map_err(|e| ArcaneError::Storage {
        source: Box::new(e),
    })?;
    let id = player.id.clone();
    let session_id = player.session_id.clone();
    let joined_at = player.joined_at;
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let body = match tx.query_row(
                "SELECT body FROM players WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            ) {
                Ok(text) => {
                    let mut base: Value = serde_json::from_str(&text).map_err(other_err)?;
                    merge_document(&mut base, &patch);
                    base
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => patch,
                Err(e) => return Err(e.into()),
            };
            let text = serde_json::to_string(&body).map_err(other_err)?;
            tx.execute(
                "INSERT INTO players (id, session_id, joined_at, body) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET joined_at = excluded.joined_at, body = excluded.body",
                params![id, session_id, joined_at, text],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Player documents for a session, ordered by join time ascending.
///
/// Bodies that are not valid JSON are skipped with a warning; schema-level
/// decoding is the subscriber's concern.
pub async fn players_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<Value>, ArcaneError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT body FROM players WHERE session_id = ?1 ORDER BY joined_at ASC",
            )?;
            let rows = stmt.query_map(params![session_id], |row| row.get::<_, String>(0))?;
            let mut docs = Vec::new();
            for row in rows {
                let text = row?;
                match serde_json::from_str(&text) {
                    Ok(value) => docs.push(value),
                    Err(e) => tracing::warn!(error = %e, "skipping unparseable player document"),
                }
            }
            Ok(docs)
        })
        .await
        .map_err(map_tr_err)
}
