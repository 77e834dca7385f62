//! Database module
//!
//! Provides durable session storage for chat transcripts.

mod schema;

use schema::SCHEMA;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Storage ====================

    pub fn get_item(&self, session_id: &str, key: &str) -> DbResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM session_storage WHERE session_id = ?1 AND key = ?2",
                params![session_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, session_id: &str, key: &str, value: &str) -> DbResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO session_storage (session_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![session_id, key, value, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, session_id: &str, key: &str) -> DbResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM session_storage WHERE session_id = ?1 AND key = ?2",
            params![session_id, key],
        )?;
        Ok(())
    }

    /// Whether any item is stored for the session
    pub fn has_session(&self, session_id: &str) -> DbResult<bool> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT 1 FROM session_storage WHERE session_id = ?1 LIMIT 1",
                params![session_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Delete items last written before `cutoff` (unix seconds)
    pub fn purge_before(&self, cutoff: i64) -> DbResult<usize> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM session_storage WHERE updated_at < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }

    /// Delete items untouched for longer than `ttl`
    pub fn purge_older_than(&self, ttl: Duration) -> DbResult<usize> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.purge_before(Utc::now().timestamp().saturating_sub(ttl_secs))
    }
}
