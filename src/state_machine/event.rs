//! Events that can occur in a chat session

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Open,
    Close,
    Submit { text: String },
    Reset,

    // Corpus events
    CorpusLoaded,
    CorpusFailed { message: String },

    // Completion events
    ReplyReceived { request: u64, text: String },
    ReplyFailed { request: u64, message: String },
}
