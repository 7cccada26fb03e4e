//! Request lifecycle state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{AnswerOutcome, Event, ExplanationOutcome};
pub use state::{AskState, ConvContext, ConvState};
pub use transition::{
    transition, TransitionError, TransitionResult, NO_RESPONSE_TEXT, REQUEST_FAILED_TEXT,
};
