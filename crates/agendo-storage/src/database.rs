// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread. Do not
//! open additional connections for writes.

use agendo_core::AgendoError;
use tracing::debug;

/// Maps a tokio-rusqlite failure into the storage error variant.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AgendoError {
    AgendoError::Storage {
        source: Box::new(e),
    }
}

/// Whether a rusqlite error is a UNIQUE/CHECK constraint violation.
pub fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
}

/// Handle to the single SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and applies migrations.
    pub async fn open(path: &str) -> Result<Self, AgendoError> {
        Self::open_with(path, true).await
    }

    /// Like [`open`](Self::open) with explicit journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, AgendoError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| AgendoError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| AgendoError::storage(format!("cannot open {path}: {e}")))?;

        let journal = if wal_mode { "WAL" } else { "DELETE" };
        let migrated = conn
            .call(move |conn| -> Result<Result<(), AgendoError>, rusqlite::Error> {
                conn.pragma_update_and_check(None, "journal_mode", journal, |_| Ok(()))?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?;
        migrated?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Runs `f` on the database thread.
    pub async fn call<R, F>(&self, f: F) -> Result<R, AgendoError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.conn.call(f).await.map_err(map_tr_err)
    }

    /// Checkpoints the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), AgendoError> {
        self.call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
    }

    /// Checkpoints and closes the connection.
    pub async fn close(self) -> Result<(), AgendoError> {
        self.checkpoint().await?;
        self.conn
            .close()
            .await
            .map_err(|e| AgendoError::storage(format!("close failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/agendo.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();

        for expected in ["accounts", "appointments", "availability", "services", "sessions"] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agendo.db");
        let path = path.to_str().unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
    }

    #[tokio::test]
    async fn journal_mode_follows_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agendo.db");
        let db = Database::open_with(path.to_str().unwrap(), true).await.unwrap();
        let mode: String = db
            .call(|conn| conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await.unwrap();
    }
}
