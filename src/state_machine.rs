//! Chat widget state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
#[allow(unused_imports)] // Public API re-exports
pub use state::{ChatContext, ChatState, InFlight};
#[allow(unused_imports)] // Public API re-exports
pub use transition::{
    reply_failed_notice, transition, TransitionError, TransitionResult, LOADING_TEXT,
    LOAD_FAILED_NOTICE, STILL_LOADING_NOTICE,
};
