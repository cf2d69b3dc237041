// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and
//! embedded migrations.
//!
//! A [`Database`] wraps one shared connection. Blocking calls lock it
//! inside an executor worker closure and release it before the task
//! settles; a handle is never held across an await point. Do NOT open
//! additional connections for writes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use entag_core::{EntagError, StorageConfig};

use crate::migrations;

pub(crate) type SharedConnection = Arc<Mutex<Connection>>;

/// Shared single-writer SQLite database.
///
/// Cloning is cheap and every clone refers to the same connection.
#[derive(Clone, Debug)]
pub struct Database {
    conn: SharedConnection,
}

impl Database {
    /// Open (or create) the configured database, apply pragmas, and run
    /// pending migrations. `:memory:` opens an in-memory database.
    pub fn open(config: &StorageConfig) -> Result<Self, EntagError> {
        let in_memory = config.database_path == ":memory:";
        let mut conn = if in_memory {
            Connection::open_in_memory().map_err(sql_err)?
        } else {
            Connection::open(&config.database_path).map_err(sql_err)?
        };

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(sql_err)?;
        if config.wal_mode && !in_memory {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(sql_err)?;
        }
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(sql_err)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(sql_err)?;

        migrations::run_migrations(&mut conn)?;
        debug!(path = %config.database_path, "database opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn connection(&self) -> SharedConnection {
        Arc::clone(&self.conn)
    }
}

/// Wrap a rusqlite error as a storage failure, preserving the source.
pub(crate) fn sql_err(e: rusqlite::Error) -> EntagError {
    EntagError::Storage {
        source: Box::new(e),
    }
}

pub(crate) fn poisoned() -> EntagError {
    EntagError::Internal("database mutex poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn file_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_str().unwrap().to_string(),
            ..StorageConfig::default()
        }
    }

    #[test]
    fn open_creates_the_file_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(&file_config(&path)).unwrap();
        assert!(path.exists());

        let conn = db.connection();
        let guard = conn.lock().unwrap();
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'tag_mapping'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn open_in_memory_works() {
        let cfg = StorageConfig {
            database_path: ":memory:".to_string(),
            ..StorageConfig::default()
        };
        let db = Database::open(&cfg).unwrap();
        let conn = db.connection();
        let guard = conn.lock().unwrap();
        guard.execute_batch("SELECT 1;").unwrap();
    }

    #[test]
    fn reopening_an_existing_database_is_a_no_op_for_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        drop(Database::open(&file_config(&path)).unwrap());
        // Second open must not fail on already-applied migrations.
        Database::open(&file_config(&path)).unwrap();
    }
}
