//! Common types for completion requests

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One turn of the conversation.
///
/// Serializes in the completion API's content shape
/// (`{"role": "user", "parts": [{"text": "..."}]}`), which is also the shape
/// kept in session storage, so persisted history can be replayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireTurn", try_from = "WireTurn")]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireTurn {
    role: Role,
    parts: Vec<WirePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: String,
}

impl From<Turn> for WireTurn {
    fn from(turn: Turn) -> Self {
        Self {
            role: turn.role,
            parts: vec![WirePart { text: turn.text }],
        }
    }
}

impl TryFrom<WireTurn> for Turn {
    type Error = String;

    fn try_from(wire: WireTurn) -> Result<Self, Self::Error> {
        if wire.parts.is_empty() {
            return Err("turn has no parts".to_string());
        }
        let text = wire
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        Ok(Self {
            role: wire.role,
            text,
        })
    }
}

/// Completion request: the whole transcript plus the system instruction
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Shared across requests; rebuilt only when the corpus changes
    pub system: Arc<str>,
    pub contents: Vec<Turn>,
}

/// Completion response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Usage,
}

impl LlmResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: Usage::default(),
        }
    }
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
