// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, which
//! makes the [`Database`] handle the only writer. Do NOT open additional
//! connections for writes.

use std::path::Path;
use std::time::Duration;

use loudbot_core::LoudbotError;
use tracing::{debug, info};

/// How long SQLite waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to an open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and migrates it.
    ///
    /// Migrations run on a short-lived blocking connection before the async
    /// connection is opened.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, LoudbotError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(LoudbotError::backend)?;
            }
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), LoudbotError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(LoudbotError::backend)?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| LoudbotError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(LoudbotError::backend)?;

        let journal_mode = conn
            .call(move |conn| -> Result<String, rusqlite::Error> {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                } else {
                    conn.pragma_query_value(None, "journal_mode", |row| row.get(0))
                }
            })
            .await
            .map_err(map_tr_err)?;

        info!(path, journal_mode = %journal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The async connection all queries go through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(&self) -> Result<(), LoudbotError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");

        self.conn.clone().close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Maps a tokio-rusqlite error onto [`LoudbotError::BackendUnavailable`].
pub fn map_tr_err(err: tokio_rusqlite::Error<rusqlite::Error>) -> LoudbotError {
    match err {
        tokio_rusqlite::Error::Error(e) => LoudbotError::backend(e),
        tokio_rusqlite::Error::Close((_, e)) => LoudbotError::backend(e),
        tokio_rusqlite::Error::ConnectionClosed => LoudbotError::BackendUnavailable {
            source: "database connection closed".into(),
        },
        _ => LoudbotError::BackendUnavailable {
            source: "unexpected database error".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("louds.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        assert!(path.exists());

        let tables: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'messages'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[tokio::test]
    async fn wal_mode_is_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.pragma_query_value(None, "journal_mode", |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twice.db");
        let path = path.to_str().unwrap();

        let db = Database::open(path, true).await.unwrap();
        db.close().await.unwrap();
        let db = Database::open(path, true).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn adopts_existing_messages_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE messages (id INTEGER PRIMARY KEY, text TEXT, author TEXT, score INTEGER, views INTEGER);
                 INSERT INTO messages (text, author, score, views) VALUES ('OLD LOUD LINE', 'Ancient', 3, 7);",
            )
            .unwrap();
        }

        let db = Database::open(path.to_str().unwrap(), false).await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
