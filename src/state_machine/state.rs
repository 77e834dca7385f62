//! Chat lifecycle state types

use serde::{Deserialize, Serialize};

/// Background work that outlives a widget close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InFlight {
    /// The one-shot corpus fetch
    CorpusLoad,
    /// A completion request, identified so late replies can be told apart
    Reply { request: u64 },
}

/// Chat widget state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// Widget hidden; work started while open keeps running
    Closed { in_flight: Option<InFlight> },

    /// Widget shown, corpus fetch in flight
    OpenLoading,

    /// Widget shown, accepting input
    OpenReady,

    /// Widget shown, completion request in flight
    OpenAwaitingReply { request: u64 },
}

impl Default for ChatState {
    fn default() -> Self {
        ChatState::Closed { in_flight: None }
    }
}

impl ChatState {
    /// The open state carrying the given background work
    pub fn open_with(in_flight: Option<InFlight>) -> Self {
        match in_flight {
            None => ChatState::OpenReady,
            Some(InFlight::CorpusLoad) => ChatState::OpenLoading,
            Some(InFlight::Reply { request }) => ChatState::OpenAwaitingReply { request },
        }
    }

    pub fn is_open(self) -> bool {
        !matches!(self, ChatState::Closed { .. })
    }

    pub fn in_flight(self) -> Option<InFlight> {
        match self {
            ChatState::Closed { in_flight } => in_flight,
            ChatState::OpenLoading => Some(InFlight::CorpusLoad),
            ChatState::OpenReady => None,
            ChatState::OpenAwaitingReply { request } => Some(InFlight::Reply { request }),
        }
    }

    /// Same visibility, different background work
    pub fn with_in_flight(self, in_flight: Option<InFlight>) -> Self {
        if self.is_open() {
            Self::open_with(in_flight)
        } else {
            ChatState::Closed { in_flight }
        }
    }

    pub fn closed(self) -> Self {
        ChatState::Closed {
            in_flight: self.in_flight(),
        }
    }

    pub fn is_loading(self) -> bool {
        self.in_flight() == Some(InFlight::CorpusLoad)
    }

    /// Request id of the reply being waited on, if any
    pub fn awaited_request(self) -> Option<u64> {
        match self.in_flight() {
            Some(InFlight::Reply { request }) => Some(request),
            _ => None,
        }
    }
}

/// Read-only facts about the session the transition depends on
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatContext {
    /// A corpus has been loaded and cached
    pub corpus_loaded: bool,
    /// The feed shows anything besides the loading placeholder
    pub has_conversation: bool,
    /// Id assigned to the next accepted message
    pub next_request: u64,
}
