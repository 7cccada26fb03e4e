//! Events that drive the request lifecycle

use crate::gateway::{AskResponse, GatewayError};
use crate::store::{ChatMessage, MessageId};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Surface events
    Submit {
        question: String,
    },
    DeepRequested {
        id: MessageId,
        /// Snapshot of the target message, `None` when it no longer exists
        message: Option<ChatMessage>,
    },

    // Gateway events
    AnswerSettled {
        outcome: AnswerOutcome,
    },
    ExplanationSettled {
        id: MessageId,
        outcome: ExplanationOutcome,
    },
}

/// How a question/answer exchange ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered(String),
    /// The service reported an error in its payload
    Reported(String),
    /// Neither answer nor error
    Empty,
    /// The request itself failed
    Failed(String),
}

impl AnswerOutcome {
    pub fn from_result(result: Result<AskResponse, GatewayError>) -> Self {
        match result {
            Ok(response) => {
                if let Some(error) = response.reported_error() {
                    AnswerOutcome::Reported(error.to_string())
                } else if let Some(answer) = response.answer_text() {
                    AnswerOutcome::Answered(answer.to_string())
                } else {
                    AnswerOutcome::Empty
                }
            }
            Err(e) => AnswerOutcome::Failed(e.message),
        }
    }
}

/// How a deep explanation request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplanationOutcome {
    Explained(String),
    Reported(String),
    Empty,
    Failed(String),
}

impl ExplanationOutcome {
    pub fn from_result(result: Result<AskResponse, GatewayError>) -> Self {
        match result {
            Ok(response) => {
                if let Some(error) = response.reported_error() {
                    ExplanationOutcome::Reported(error.to_string())
                } else if let Some(text) = response.explanation_text() {
                    ExplanationOutcome::Explained(text.to_string())
                } else {
                    ExplanationOutcome::Empty
                }
            }
            Err(e) => ExplanationOutcome::Failed(e.message),
        }
    }
}
