//! Authenticated identity and subject selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Subjects offered by the sidebar
pub const KNOWN_SUBJECTS: &[&str] = &["Artificial Intelligence", "Machine Learning"];

/// Subject selected before the user picks one
pub const DEFAULT_SUBJECT: &str = "Artificial Intelligence";

/// Backend user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(UserId)
    }
}

/// Authenticated identity held for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    /// Bearer credential; sessions restored from older storage may lack one
    pub token: Option<String>,
    pub username: String,
}

impl Session {
    pub fn new(user_id: UserId, token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id,
            token: Some(token.into()),
            username: username.into(),
        }
    }
}

/// Opaque topic selector sent along with every question
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the subject appears in the sidebar list
    pub fn is_known(&self) -> bool {
        KNOWN_SUBJECTS.contains(&self.0.as_str())
    }

    pub fn known() -> impl Iterator<Item = Subject> {
        KNOWN_SUBJECTS.iter().map(|s| Subject::new(*s))
    }
}

impl Default for Subject {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Subject {
    fn from(value: String) -> Self {
        Self(value)
    }
}
