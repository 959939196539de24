//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode and recommended PRAGMAs on initialization.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use portfolio_core::error::PortfolioError;

use crate::migrations;

/// Thread-safe SQLite database wrapper.
///
/// The connection is wrapped in a Mutex since rusqlite Connection is not Sync.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode, synchronous=NORMAL, foreign keys, and runs
    /// all pending migrations.
    pub fn new(path: &Path) -> Result<Self, PortfolioError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| PortfolioError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| PortfolioError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        Self::migrated(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, PortfolioError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            PortfolioError::Storage(format!("Failed to open in-memory db: {}", e))
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| PortfolioError::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::migrated(conn)
    }

    fn migrated(conn: Connection) -> Result<Self, PortfolioError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, PortfolioError>
    where
        F: FnOnce(&Connection) -> Result<T, PortfolioError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PortfolioError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Execute a closure inside a transaction, committing on `Ok`.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T, PortfolioError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, PortfolioError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| PortfolioError::Storage(format!("Database lock poisoned: {}", e)))?;
        let tx = conn
            .transaction()
            .map_err(|e| PortfolioError::Storage(format!("Failed to begin transaction: {}", e)))?;
        let value = f(&tx)?;
        tx.commit()
            .map_err(|e| PortfolioError::Storage(format!("Failed to commit: {}", e)))?;
        Ok(value)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_blogs(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM blogs", [], |row| row.get(0))
                .map_err(|e| PortfolioError::Storage(e.to_string()))
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert_eq!(count_blogs(&db), 0);
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("test.db");
        let db = Database::new(&path).unwrap();
        assert_eq!(count_blogs(&db), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();
        let enabled: i64 = db
            .with_conn(|conn| {
                conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                    .map_err(|e| PortfolioError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_with_tx_rolls_back_on_error() {
        let db = Database::in_memory().unwrap();
        let result: Result<(), PortfolioError> = db.with_tx(|tx| {
            tx.execute(
                "INSERT INTO tags (name, slug, created_at, updated_at) VALUES ('a', 'a', 0, 0)",
                [],
            )
            .map_err(|e| PortfolioError::Storage(e.to_string()))?;
            Err(PortfolioError::Storage("boom".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
                    .map_err(|e| PortfolioError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
