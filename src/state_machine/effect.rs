//! Effects produced by state transitions

use crate::llm::Turn;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the one-shot corpus fetch
    LoadCorpus,

    /// Show the loading placeholder
    ShowLoading,

    /// Remove the loading placeholder
    DismissLoading,

    /// Show the greeting (display only, never persisted)
    ShowGreeting,

    /// Show a local, non-persisted bot message
    ShowNotice { text: String },

    /// Append a turn to the transcript, persist it, and show it
    AppendTurn { turn: Turn },

    /// Send the transcript to the completion API
    RequestCompletion { request: u64 },

    /// Drop the transcript, its persisted copy, and the feed
    ClearHistory,
}

impl Effect {
    pub fn notice(text: impl Into<String>) -> Self {
        Effect::ShowNotice { text: text.into() }
    }

    pub fn append_user(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: Turn::user(text),
        }
    }

    pub fn append_model(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: Turn::model(text),
        }
    }
}
