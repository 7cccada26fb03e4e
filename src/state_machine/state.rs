//! Request lifecycle state

use crate::store::{MessageId, Session, Subject};
use std::collections::BTreeSet;

/// Lifecycle of the question/answer exchange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AskState {
    #[default]
    Idle,
    /// A question was appended and its answer has not settled yet.
    /// `generation` is the conversation generation the question went into.
    Pending { question: String, generation: u64 },
}

/// Controller state: at most one ask in flight, at most one deep request per message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvState {
    pub ask: AskState,
    pub deep_pending: BTreeSet<MessageId>,
}

impl ConvState {
    pub fn is_pending(&self) -> bool {
        matches!(self.ask, AskState::Pending { .. })
    }

    pub fn is_deep_pending(&self, id: MessageId) -> bool {
        self.deep_pending.contains(&id)
    }
}

/// Read-only store snapshot a transition may consult
#[derive(Debug, Clone, Default)]
pub struct ConvContext {
    pub session: Option<Session>,
    pub subject: Subject,
    /// Bumped every time the conversation is cleared
    pub generation: u64,
}
