//! API request and response types

use crate::runtime::{ChatView, SendOutcome};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

/// A session and what its widget shows
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub view: ChatView,
}

/// Response for a send
#[derive(Debug, Serialize)]
pub struct SendResponse {
    #[serde(flatten)]
    pub outcome: SendOutcome,
    pub view: ChatView,
}

/// Response for the fullscreen toggle
#[derive(Debug, Serialize)]
pub struct FullscreenResponse {
    pub fullscreen: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
