//! Session-scoped storage for the chat transcript
//!
//! Mirrors the browser's session storage: a small key-value surface scoped to
//! one browsing session. The transcript lives under a single key as JSON.

use crate::db::{Database, DbError};
use crate::llm::Turn;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Key holding the serialized transcript
pub const HISTORY_KEY: &str = "docs_chat.history";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key-value storage scoped to a single session
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage. Clones share the same items, which lets tests model
/// a page reload by handing the same storage to a fresh controller.
#[allow(dead_code)] // Used by tests
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

#[allow(dead_code)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// Adapter scoping the shared database to one session
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
    session_id: String,
}

impl SqliteStorage {
    pub fn new(db: Database, session_id: impl Into<String>) -> Self {
        Self {
            db,
            session_id: session_id.into(),
        }
    }
}

impl SessionStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.db.get_item(&self.session_id, key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Ok(self.db.set_item(&self.session_id, key, value)?)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        Ok(self.db.remove_item(&self.session_id, key)?)
    }
}

/// Typed view of the transcript stored under [`HISTORY_KEY`]
pub struct History<S> {
    storage: S,
}

impl<S: SessionStorage> History<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the persisted transcript.
    ///
    /// Content that does not parse is discarded (and removed) so a corrupted
    /// entry cannot wedge the session; the chat starts over empty.
    pub fn load(&self) -> Vec<Turn> {
        let raw = match self.storage.get_item(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read chat history");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Turn>>(&raw) {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed chat history");
                if let Err(e) = self.storage.remove_item(HISTORY_KEY) {
                    tracing::error!(error = %e, "Failed to remove malformed chat history");
                }
                Vec::new()
            }
        }
    }

    pub fn save(&self, turns: &[Turn]) -> Result<(), StorageError> {
        let json = serde_json::to_string(turns)?;
        self.storage.set_item(HISTORY_KEY, &json)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(HISTORY_KEY)
    }
}
