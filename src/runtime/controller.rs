//! Chat session controller
//!
//! Drives the state machine for one browser session: runs the transition
//! under a short-lived lock, executes the resulting effects, and performs
//! network I/O (corpus fetch, completion request) with the lock released.

use super::traits::LlmClient;
use crate::corpus::{Corpus, CorpusSource};
use crate::llm::{LlmRequest, Role, Turn};
use crate::render::{render_markdown, render_user_text};
use crate::state_machine::{
    transition, ChatContext, ChatState, Effect, Event, TransitionError, LOADING_TEXT,
    STILL_LOADING_NOTICE,
};
use crate::storage::{History, SessionStorage, StorageError};
use crate::system_prompt::build_system_instruction;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Shown once when the transcript could not be written; later writes retry it
pub const SAVE_FAILED_NOTICE: &str =
    "Your conversation could not be saved and may be lost if you leave this page.";

/// Who a feed entry is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// What a feed entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A transcript turn
    Turn,
    Greeting,
    /// The loading placeholder
    Loading,
    /// A local status or error message, never persisted
    Notice,
}

/// One displayed message, rendered when it is added
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub sender: Sender,
    pub kind: EntryKind,
    pub text: String,
    pub html: String,
    pub code_blocks: Vec<String>,
}

impl FeedEntry {
    fn bot(kind: EntryKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let rendered = render_markdown(&text);
        Self {
            sender: Sender::Bot,
            kind,
            text,
            html: rendered.html,
            code_blocks: rendered.code_blocks,
        }
    }

    fn from_turn(turn: &Turn) -> Self {
        match turn.role {
            Role::Model => Self::bot(EntryKind::Turn, turn.text.clone()),
            Role::User => {
                let rendered = render_user_text(&turn.text);
                Self {
                    sender: Sender::User,
                    kind: EntryKind::Turn,
                    text: turn.text.clone(),
                    html: rendered.html,
                    code_blocks: rendered.code_blocks,
                }
            }
        }
    }
}

/// Snapshot of everything the widget displays
#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub state: ChatState,
    pub open: bool,
    pub fullscreen: bool,
    pub loading: bool,
    pub awaiting_reply: bool,
    /// Page count of the loaded documentation
    pub pages: Option<usize>,
    pub entries: Vec<FeedEntry>,
}

/// How a send request ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    /// Empty input; nothing happened
    Ignored,
    /// The documentation has not loaded; a notice was shown
    StillLoading,
    /// A reply is already pending
    Busy,
    /// The widget is closed
    Closed,
    /// The model reply was appended
    Replied,
    /// The request failed; a notice was shown
    Failed { message: String },
    /// The reply arrived after a reset and was dropped
    Discarded,
}

/// Corpus plus the system instruction built from it
struct LoadedCorpus {
    corpus: Arc<Corpus>,
    system: Arc<str>,
}

struct Inner {
    state: ChatState,
    transcript: Vec<Turn>,
    feed: Vec<FeedEntry>,
    corpus: Option<LoadedCorpus>,
    fullscreen: bool,
    next_request: u64,
    /// The last write of the transcript failed
    unsaved: bool,
}

impl Inner {
    fn context(&self) -> ChatContext {
        ChatContext {
            corpus_loaded: self.corpus.is_some(),
            has_conversation: self.feed.iter().any(|e| e.kind != EntryKind::Loading),
            next_request: self.next_request,
        }
    }
}

/// Work that must run with the lock released
enum Pending {
    LoadCorpus,
    Completion { request: u64, body: LlmRequest },
}

/// Controller for one chat session
pub struct ChatSession<S, C, L>
where
    S: SessionStorage,
    C: CorpusSource,
    L: LlmClient,
{
    id: String,
    greeting: String,
    history: History<S>,
    corpus_source: C,
    llm_client: L,
    inner: Mutex<Inner>,
}

impl<S, C, L> ChatSession<S, C, L>
where
    S: SessionStorage,
    C: CorpusSource,
    L: LlmClient,
{
    /// Create a session, restoring any transcript persisted in `storage`
    pub fn new(
        id: impl Into<String>,
        greeting: impl Into<String>,
        storage: S,
        corpus_source: C,
        llm_client: L,
    ) -> Self {
        let id = id.into();
        let history = History::new(storage);
        let transcript = history.load();
        let feed = transcript.iter().map(FeedEntry::from_turn).collect();

        if !transcript.is_empty() {
            tracing::debug!(session_id = %id, turns = transcript.len(), "Restored chat history");
        }

        Self {
            id,
            greeting: greeting.into(),
            history,
            corpus_source,
            llm_client,
            inner: Mutex::new(Inner {
                state: ChatState::default(),
                transcript,
                feed,
                corpus: None,
                fullscreen: false,
                next_request: 1,
                unsaved: false,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Show the widget, loading the documentation on first use
    #[allow(dead_code)] // Used by tests; the API spawns the load instead
    pub async fn open(&self) {
        if self.show() {
            self.load_documentation().await;
        }
    }

    /// Show the widget without waiting on the documentation. Returns true
    /// when a load is due; run it with [`Self::load_documentation`].
    pub fn show(&self) -> bool {
        let pending = {
            let mut inner = self.inner.lock();
            self.apply_logged(&mut inner, Event::Open)
        };
        pending.iter().any(|work| matches!(work, Pending::LoadCorpus))
    }

    /// Fetch the documentation and feed the result to the state machine
    pub async fn load_documentation(&self) {
        self.load_corpus().await;
    }

    /// Hide the widget; in-flight work keeps running
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        self.apply_logged(&mut inner, Event::Close);
    }

    /// Submit a user message and wait for the reply
    pub async fn send(&self, text: &str) -> SendOutcome {
        let pending = {
            let mut inner = self.inner.lock();
            let event = Event::Submit {
                text: text.to_string(),
            };
            match self.apply(&mut inner, event) {
                Ok(pending) => pending,
                Err(TransitionError::EmptyMessage) => return SendOutcome::Ignored,
                Err(TransitionError::CorpusNotLoaded) => {
                    inner
                        .feed
                        .push(FeedEntry::bot(EntryKind::Notice, STILL_LOADING_NOTICE));
                    return SendOutcome::StillLoading;
                }
                Err(TransitionError::AwaitingReply) => return SendOutcome::Busy,
                Err(TransitionError::Closed) => return SendOutcome::Closed,
                Err(e) => {
                    tracing::warn!(session_id = %self.id, error = %e, "Message rejected");
                    return SendOutcome::Ignored;
                }
            }
        };

        self.run_pending(pending)
            .await
            .unwrap_or(SendOutcome::Discarded)
    }

    /// Clear the conversation and start over with a fresh greeting
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        self.apply_logged(&mut inner, Event::Reset);
        tracing::info!(session_id = %self.id, "Chat history cleared");
    }

    /// Flip fullscreen mode, returning the new value
    pub fn toggle_fullscreen(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.fullscreen = !inner.fullscreen;
        inner.fullscreen
    }

    pub fn view(&self) -> ChatView {
        let inner = self.inner.lock();
        ChatView {
            state: inner.state,
            open: inner.state.is_open(),
            fullscreen: inner.fullscreen,
            loading: inner.state.is_loading(),
            awaiting_reply: inner.state.awaited_request().is_some(),
            pages: inner.corpus.as_ref().map(|c| c.corpus.page_count()),
            entries: inner.feed.clone(),
        }
    }

    pub fn transcript(&self) -> Vec<Turn> {
        self.inner.lock().transcript.clone()
    }

    /// A corpus load or completion is in flight
    pub fn is_busy(&self) -> bool {
        self.inner.lock().state.in_flight().is_some()
    }

    // ========================================================================
    // Effect execution
    // ========================================================================

    fn apply(&self, inner: &mut Inner, event: Event) -> Result<Vec<Pending>, TransitionError> {
        let result = transition(&inner.state, &inner.context(), event)?;

        if result.new_state != inner.state {
            tracing::debug!(
                session_id = %self.id,
                from = ?inner.state,
                to = ?result.new_state,
                "State transition"
            );
        }
        inner.state = result.new_state;

        let mut pending = Vec::new();
        for effect in result.effects {
            if let Some(work) = self.execute_effect(inner, effect) {
                pending.push(work);
            }
        }
        Ok(pending)
    }

    fn apply_logged(&self, inner: &mut Inner, event: Event) -> Vec<Pending> {
        self.apply(inner, event).unwrap_or_else(|e| {
            tracing::warn!(session_id = %self.id, error = %e, "Event rejected");
            Vec::new()
        })
    }

    fn execute_effect(&self, inner: &mut Inner, effect: Effect) -> Option<Pending> {
        match effect {
            Effect::LoadCorpus => return Some(Pending::LoadCorpus),

            Effect::ShowLoading => {
                inner
                    .feed
                    .push(FeedEntry::bot(EntryKind::Loading, LOADING_TEXT));
            }

            Effect::DismissLoading => inner.feed.retain(|e| e.kind != EntryKind::Loading),

            Effect::ShowGreeting => {
                inner
                    .feed
                    .push(FeedEntry::bot(EntryKind::Greeting, self.greeting.clone()));
            }

            Effect::ShowNotice { text } => inner.feed.push(FeedEntry::bot(EntryKind::Notice, text)),

            Effect::AppendTurn { turn } => {
                inner.feed.push(FeedEntry::from_turn(&turn));
                inner.transcript.push(turn);
                let saved = self.history.save(&inner.transcript);
                self.record_persist(inner, saved);
            }

            Effect::RequestCompletion { request } => {
                inner.next_request = request + 1;
                let Some(loaded) = inner.corpus.as_ref() else {
                    tracing::error!(session_id = %self.id, request, "Completion requested without documentation");
                    return None;
                };
                return Some(Pending::Completion {
                    request,
                    body: LlmRequest {
                        system: loaded.system.clone(),
                        contents: inner.transcript.clone(),
                    },
                });
            }

            Effect::ClearHistory => {
                inner.transcript.clear();
                inner.feed.clear();
                inner.unsaved = false;
                let cleared = self.history.clear();
                self.record_persist(inner, cleared);
            }
        }
        None
    }

    /// Every write stores the whole transcript, so the next successful one
    /// repairs an earlier failure.
    fn record_persist(&self, inner: &mut Inner, result: Result<(), StorageError>) {
        match result {
            Ok(()) => inner.unsaved = false,
            Err(e) => {
                tracing::error!(session_id = %self.id, error = %e, "Failed to persist chat history");
                if !inner.unsaved {
                    inner.unsaved = true;
                    inner
                        .feed
                        .push(FeedEntry::bot(EntryKind::Notice, SAVE_FAILED_NOTICE));
                }
            }
        }
    }

    /// Run deferred work; returns the outcome of a completion if one ran
    async fn run_pending(&self, pending: Vec<Pending>) -> Option<SendOutcome> {
        let mut outcome = None;
        for work in pending {
            match work {
                Pending::LoadCorpus => self.load_corpus().await,
                Pending::Completion { request, body } => {
                    outcome = Some(self.complete(request, body).await);
                }
            }
        }
        outcome
    }

    async fn load_corpus(&self) {
        tracing::info!(session_id = %self.id, "Loading documentation");
        let result = self.corpus_source.load().await;

        let mut inner = self.inner.lock();
        let event = match result {
            Ok(corpus) => {
                let system: Arc<str> = build_system_instruction(&corpus).into();
                inner.corpus = Some(LoadedCorpus {
                    corpus: Arc::new(corpus),
                    system,
                });
                Event::CorpusLoaded
            }
            Err(e) => {
                tracing::error!(session_id = %self.id, error = %e, "Failed to load documentation");
                Event::CorpusFailed {
                    message: e.to_string(),
                }
            }
        };
        self.apply_logged(&mut inner, event);
    }

    async fn complete(&self, request: u64, body: LlmRequest) -> SendOutcome {
        let result = self.llm_client.complete(&body).await;

        let mut inner = self.inner.lock();
        if let (Ok(response), Some(loaded)) = (&result, inner.corpus.as_ref()) {
            let unknown = loaded.corpus.unknown_links(&response.text);
            if !unknown.is_empty() {
                tracing::warn!(session_id = %self.id, request, links = ?unknown, "Reply links outside the documentation");
            }
        }

        let (event, outcome) = match result {
            Ok(response) => (
                Event::ReplyReceived {
                    request,
                    text: response.text,
                },
                SendOutcome::Replied,
            ),
            Err(e) => (
                Event::ReplyFailed {
                    request,
                    message: e.message.clone(),
                },
                SendOutcome::Failed { message: e.message },
            ),
        };

        match self.apply(&mut inner, event) {
            Ok(_) => outcome,
            Err(TransitionError::StaleReply { request }) => {
                tracing::info!(session_id = %self.id, request, "Discarding reply to abandoned request");
                SendOutcome::Discarded
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Reply rejected");
                SendOutcome::Discarded
            }
        }
    }
}
