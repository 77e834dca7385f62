//! HTTP API for the chat widget
//!
//! Session endpoints drive one [`ChatSession`](crate::runtime::ChatSession)
//! each; the widget endpoints serve the snippet and its embedded assets.

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;

use crate::config::ChatConfig;
use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Absent when no API key is configured; the chat endpoints then refuse
    pub sessions: Option<Arc<SessionManager>>,
    pub config: Arc<ChatConfig>,
}

impl AppState {
    pub fn new(sessions: Option<Arc<SessionManager>>, config: ChatConfig) -> Self {
        Self {
            sessions,
            config: Arc::new(config),
        }
    }
}
