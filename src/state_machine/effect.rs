//! Effects produced by state transitions

use crate::gateway::AskRequest;
use crate::store::{ChatMessage, MessageId};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the conversation
    AppendMessage(ChatMessage),

    /// Attach a deep explanation to an existing message
    EnrichMessage { id: MessageId, explanation: String },

    /// Publish the ask pending flag
    NotifyAskPending(bool),

    /// Publish a per-message loading indicator
    NotifyDeepLoading { id: MessageId, loading: bool },

    /// Ask the gateway for an answer
    RequestAnswer(AskRequest),

    /// Ask the gateway for a deep explanation of `id`
    RequestExplanation { id: MessageId, request: AskRequest },
}

impl Effect {
    pub fn append_user(content: impl Into<String>) -> Self {
        Effect::AppendMessage(ChatMessage::user(content))
    }

    pub fn append_assistant(content: impl Into<String>) -> Self {
        Effect::AppendMessage(ChatMessage::assistant(content))
    }

    pub fn append_answer(content: impl Into<String>, question: impl Into<String>) -> Self {
        Effect::AppendMessage(ChatMessage::answer(content, question))
    }
}
