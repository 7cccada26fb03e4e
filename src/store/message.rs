//! Chat message types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to a message within a store.
///
/// Ids are allocated monotonically and never reused, not even after the
/// conversation is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    User {
        content: String,
    },
    Assistant {
        content: String,
        /// Question that produced this answer, kept for deep explanations
        #[serde(default, skip_serializing_if = "Option::is_none")]
        question: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deep_explanation: Option<String>,
    },
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    /// Assistant text with no question attached (errors, fallbacks)
    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
            question: None,
            deep_explanation: None,
        }
    }

    /// Successful answer to `question`
    pub fn answer(content: impl Into<String>, question: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
            question: Some(question.into()),
            deep_explanation: None,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            ChatMessage::User { .. } => Role::User,
            ChatMessage::Assistant { .. } => Role::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatMessage::User { content } | ChatMessage::Assistant { content, .. } => content,
        }
    }

    pub fn question(&self) -> Option<&str> {
        match self {
            ChatMessage::Assistant { question, .. } => question.as_deref(),
            ChatMessage::User { .. } => None,
        }
    }

    pub fn deep_explanation(&self) -> Option<&str> {
        match self {
            ChatMessage::Assistant {
                deep_explanation, ..
            } => deep_explanation.as_deref(),
            ChatMessage::User { .. } => None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, ChatMessage::Assistant { .. })
    }

    /// Attach a deep explanation. Only succeeds once, and only on assistant messages.
    pub(crate) fn set_deep_explanation(&mut self, explanation: String) -> bool {
        match self {
            ChatMessage::Assistant {
                deep_explanation: slot @ None,
                ..
            } => {
                *slot = Some(explanation);
                true
            }
            _ => false,
        }
    }
}
