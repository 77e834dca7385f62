//! Runtime for chat sessions
//!
//! One [`ChatSession`] per browser session, created on demand and evicted
//! once idle for the session TTL. Transcripts are persisted through sqlite so
//! an evicted session, or a restarted server, resumes them.

mod controller;
pub mod traits;


#[allow(unused_imports)] // Public API re-exports
pub use controller::{
    ChatSession, ChatView, EntryKind, FeedEntry, SendOutcome, Sender, SAVE_FAILED_NOTICE,
};
pub use traits::*;

use crate::corpus::CorpusSource;
use crate::db::Database;
use crate::storage::SqliteStorage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Upper bound on the time between idle sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Type alias for production sessions with concrete implementations
pub type ProductionSession = ChatSession<SqliteStorage, Arc<dyn CorpusSource>, Arc<dyn LlmClient>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid session id: {0}")]
    InvalidId(String),
    #[error("Session storage unavailable: {0}")]
    Storage(String),
}

/// A live session and when it was last used
struct SessionSlot {
    session: Arc<ProductionSession>,
    last_active: Mutex<Instant>,
}

impl SessionSlot {
    fn new(session: ProductionSession) -> Self {
        Self {
            session: Arc::new(session),
            last_active: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) -> Arc<ProductionSession> {
        *self.last_active.lock() = Instant::now();
        self.session.clone()
    }

    fn idle_for(&self) -> Duration {
        self.last_active.lock().elapsed()
    }
}

/// Manager for all chat sessions
pub struct SessionManager {
    db: Database,
    corpus_source: Arc<dyn CorpusSource>,
    llm_client: Arc<dyn LlmClient>,
    greeting: String,
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

impl SessionManager {
    pub fn new(
        db: Database,
        corpus_source: Arc<dyn CorpusSource>,
        llm_client: Arc<dyn LlmClient>,
        greeting: impl Into<String>,
    ) -> Self {
        tracing::info!(model = %llm_client.model_id(), "Session manager ready");
        Self {
            db,
            corpus_source,
            llm_client,
            greeting: greeting.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session under a fresh id
    pub async fn create_session(&self) -> Arc<ProductionSession> {
        let id = Uuid::new_v4().to_string();
        let slot = SessionSlot::new(self.build(&id));
        let session = slot.session.clone();
        self.sessions.write().await.insert(id.clone(), slot);
        tracing::info!(session_id = %id, "Created chat session");
        session
    }

    /// Get or create the session for an id, restoring its persisted history
    pub async fn get_or_create(&self, id: &str) -> Result<Arc<ProductionSession>, SessionError> {
        let id = parse_id(id)?;

        if let Some(slot) = self.sessions.read().await.get(&id) {
            return Ok(slot.touch());
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id.clone())
            .or_insert_with(|| SessionSlot::new(self.build(&id)))
            .touch();
        Ok(session)
    }

    /// Look up a session that is live or has persisted state. Unknown ids
    /// yield `None` and create nothing.
    pub async fn find(&self, id: &str) -> Result<Option<Arc<ProductionSession>>, SessionError> {
        let id = parse_id(id)?;

        if let Some(slot) = self.sessions.read().await.get(&id) {
            return Ok(Some(slot.touch()));
        }

        let persisted = self
            .db
            .has_session(&id)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        if !persisted {
            return Ok(None);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id.clone())
            .or_insert_with(|| SessionSlot::new(self.build(&id)))
            .touch();
        tracing::debug!(session_id = %id, "Resumed persisted session");
        Ok(Some(session))
    }

    /// Drop sessions idle for at least `ttl`. Sessions with a corpus load or
    /// reply in flight are kept. Returns how many were dropped.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| slot.idle_for() < ttl || slot.session.is_busy());
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Evicted idle chat sessions");
        }
        evicted
    }

    /// Periodically evict idle sessions and purge their stored transcripts
    pub fn spawn_sweeper(self: &Arc<Self>, ttl: Duration) {
        let manager = Arc::clone(self);
        let period = ttl.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
        tracing::info!(
            ttl_secs = ttl.as_secs(),
            period_secs = period.as_secs(),
            "Starting idle session sweeper"
        );

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            loop {
                timer.tick().await;
                manager.evict_idle(ttl).await;
                match manager.db.purge_older_than(ttl) {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "Expired stale session data"),
                    Err(e) => tracing::error!(error = %e, "Failed to purge session data"),
                }
            }
        });
    }

    #[allow(dead_code)] // Used by tests
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn build(&self, id: &str) -> ProductionSession {
        ChatSession::new(
            id,
            self.greeting.clone(),
            SqliteStorage::new(self.db.clone(), id),
            self.corpus_source.clone(),
            self.llm_client.clone(),
        )
    }
}

fn parse_id(id: &str) -> Result<String, SessionError> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| SessionError::InvalidId(id.to_string()))
}
