// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session document operations.

use arcane_core::{ArcaneError, Session};
use rusqlite::params;
use serde_json::Value;

use crate::database::{Database, map_tr_err, other_err};
use crate::merge::merge_document;

/// Insert a new session document. The code column is denormalized for the
/// join-by-code equality query.
pub async fn create_session(db: &Database, session: &Session) -> Result<(), ArcaneError> {
    let body = serde_json::to_string(session).map_err(|e| ArcaneError::Storage {
        source: Box::new(e),
    })?;
    let id = session.id.clone();
    let code = session.code.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, code, body) VALUES (?1, ?2, ?3)",
                params![id, code, body],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session document by id.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Value>, ArcaneError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT body FROM sessions WHERE id = ?1",
                params![id],
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

/// Find a session by exact code match (at most one).
pub async fn find_session_by_code(
    db: &Database,
    code: &str,
) -> Result<Option<Value>, ArcaneError> {
    let code = code.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT body FROM sessions WHERE code = ?1 LIMIT 1",
                params![code],
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

/// Field-level merge into a session document.
///
/// Returns `false` without writing when the session does not exist.
pub async fn merge_session(
    db: &Database,
    id: &str,
    patch: Value,
) -> Result<bool, ArcaneError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let existing = match tx.query_row(
                "SELECT body FROM sessions WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            ) {
                Ok(text) => text,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(false),
                Err(e) => return Err(e.into()),
            };
            let mut body: Value = serde_json::from_str(&existing).map_err(other_err)?;
            merge_document(&mut body, &patch);
            let text = serde_json::to_string(&body).map_err(other_err)?;
            tx.execute(
                "UPDATE sessions SET body = ?1 WHERE id = ?2",
                params![text, id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}
