//! Pure state transition function

use super::{ChatContext, ChatState, Effect, Event};
use thiserror::Error;

/// Placeholder shown while the corpus loads
pub const LOADING_TEXT: &str = "Loading documentation...";

/// Shown when the corpus fetch fails
pub const LOAD_FAILED_NOTICE: &str = "Sorry, I failed to load the documentation.";

/// Shown when a message arrives before the corpus is available
pub const STILL_LOADING_NOTICE: &str = "The documentation is still loading. Please wait a moment.";

/// Shown when a completion request fails
pub fn reply_failed_notice(message: &str) -> String {
    format!("Sorry, I encountered an error: {message}")
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Greet unless the feed already holds a conversation
    fn with_greeting(self, context: &ChatContext) -> Self {
        if context.has_conversation {
            self
        } else {
            self.with_effect(Effect::ShowGreeting)
        }
    }
}

/// Reasons an event is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("The documentation is not loaded yet")]
    CorpusNotLoaded,
    #[error("A reply is still pending")]
    AwaitingReply,
    #[error("The chat is closed")]
    Closed,
    #[error("Reply {request} is no longer awaited")]
    StaleReply { request: u64 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let state = *state;
    match event {
        // ============================================================
        // Visibility
        // ============================================================
        Event::Open => match state {
            ChatState::Closed { in_flight: None } if context.corpus_loaded => {
                Ok(TransitionResult::new(ChatState::OpenReady).with_greeting(context))
            }
            ChatState::Closed { in_flight: None } => {
                let mut result = TransitionResult::new(ChatState::OpenLoading);
                if !context.has_conversation {
                    result = result.with_effect(Effect::ShowLoading);
                }
                Ok(result.with_effect(Effect::LoadCorpus))
            }
            ChatState::Closed { in_flight } => {
                Ok(TransitionResult::new(ChatState::open_with(in_flight)))
            }
            // Already open
            _ => Ok(TransitionResult::new(state)),
        },

        Event::Close => Ok(TransitionResult::new(state.closed())),

        // ============================================================
        // Corpus loading
        // ============================================================
        Event::CorpusLoaded if state.is_loading() => Ok(TransitionResult::new(
            state.with_in_flight(None),
        )
        .with_effect(Effect::DismissLoading)
        .with_greeting(context)),

        Event::CorpusFailed { .. } if state.is_loading() => {
            Ok(TransitionResult::new(state.with_in_flight(None))
                .with_effect(Effect::DismissLoading)
                .with_effect(Effect::notice(LOAD_FAILED_NOTICE)))
        }

        Event::CorpusLoaded | Event::CorpusFailed { .. } => Err(
            TransitionError::InvalidTransition("no corpus load in flight".to_string()),
        ),

        // ============================================================
        // Messages
        // ============================================================
        Event::Submit { text } => submit(state, context, &text),

        Event::ReplyReceived { request, text } => {
            if state.awaited_request() != Some(request) {
                return Err(TransitionError::StaleReply { request });
            }
            Ok(TransitionResult::new(state.with_in_flight(None))
                .with_effect(Effect::append_model(text)))
        }

        Event::ReplyFailed { request, message } => {
            if state.awaited_request() != Some(request) {
                return Err(TransitionError::StaleReply { request });
            }
            Ok(TransitionResult::new(state.with_in_flight(None))
                .with_effect(Effect::notice(reply_failed_notice(&message))))
        }

        // ============================================================
        // Reset
        // ============================================================

        // An awaited reply is abandoned; a corpus load is kept
        Event::Reset => {
            let new_state = if state.awaited_request().is_some() {
                state.with_in_flight(None)
            } else {
                state
            };
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::ClearHistory)
                .with_effect(Effect::ShowGreeting))
        }
    }
}

fn submit(
    state: ChatState,
    context: &ChatContext,
    text: &str,
) -> Result<TransitionResult, TransitionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TransitionError::EmptyMessage);
    }

    match state {
        ChatState::Closed { .. } => Err(TransitionError::Closed),
        ChatState::OpenAwaitingReply { .. } => Err(TransitionError::AwaitingReply),
        ChatState::OpenLoading => Err(TransitionError::CorpusNotLoaded),
        ChatState::OpenReady if !context.corpus_loaded => Err(TransitionError::CorpusNotLoaded),
        ChatState::OpenReady => {
            let request = context.next_request;
            Ok(TransitionResult::new(ChatState::OpenAwaitingReply { request })
                .with_effect(Effect::append_user(text))
                .with_effect(Effect::RequestCompletion { request }))
        }
    }
}
