// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::time::Duration;

use arcane_core::ArcaneError;

/// Wrapper around a single `tokio_rusqlite::Connection`.
///
/// The `Database` IS the single writer: every query module accepts
/// `&Database` and goes through [`Database::connection`] + `call()`, which
/// serializes all closures on one background thread.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (or creates) the database at `path`, applies PRAGMAs, and runs
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, ArcaneError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_rq_err)?;

        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            crate::migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        Ok(Self { conn })
    }

    /// The underlying connection. All access goes through `call()`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Closes the connection, flushing pending work.
    pub async fn close(self) -> Result<(), ArcaneError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Maps a tokio-rusqlite error into the workspace error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> ArcaneError {
    ArcaneError::Storage {
        source: Box::new(e),
    }
}

/// Maps a rusqlite error into the workspace error type.
pub(crate) fn map_rq_err(e: rusqlite::Error) -> ArcaneError {
    ArcaneError::Storage {
        source: Box::new(e),
    }
}

/// Wraps a non-rusqlite error (e.g. serde_json) for use inside `call()`
/// closures, whose error type is `rusqlite::Error`.
pub(crate) fn other_err<E>(e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
}
