//! Request and response types of the question-answering service

use crate::store::{Subject, UserId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A question for the answering service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub user_id: UserId,
    pub subject: Subject,
    pub question: String,
    /// Ask for a deeper, analogy-based explanation of an earlier answer
    pub deep: bool,
    pub token: Option<String>,
}

/// Answer payload. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub deep_explanation: Option<String>,
    #[serde(default)]
    pub cached: Option<bool>,
    #[serde(default)]
    pub source: Option<String>,
}

impl AskResponse {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            answer: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            error: Some(text.into()),
            ..Self::default()
        }
    }

    /// Neither answer nor error
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_deep_explanation(mut self, text: impl Into<String>) -> Self {
        self.deep_explanation = Some(text.into());
        self
    }

    /// Error text reported by the service, ignoring empty strings
    pub fn reported_error(&self) -> Option<&str> {
        non_empty(self.error.as_deref())
    }

    pub fn answer_text(&self) -> Option<&str> {
        non_empty(self.answer.as_deref())
    }

    /// Deep explanation text, falling back to the answer field
    pub fn explanation_text(&self) -> Option<&str> {
        non_empty(self.deep_explanation.as_deref()).or_else(|| self.answer_text())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// One stored question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub subject: Option<String>,
    /// Calendar day; only present in the full history listing
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl HistoryRecord {
    /// Day the record belongs to
    pub fn day(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| self.created_at.date())
    }
}

/// Result of a successful login or signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    pub user_id: UserId,
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteHistoryResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub rows_deleted: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}
