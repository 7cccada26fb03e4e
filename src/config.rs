//! Client configuration from the environment

use crate::store::Subject;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const API_URL_VAR: &str = "LEARNING_ASSISTANT_API_URL";
const DB_PATH_VAR: &str = "LEARNING_ASSISTANT_DB_PATH";
const TIMEOUT_VAR: &str = "LEARNING_ASSISTANT_TIMEOUT_SECS";
const SUBJECT_VAR: &str = "LEARNING_ASSISTANT_SUBJECT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the question-answering service
    pub api_url: String,
    /// `SQLite` file holding the saved session
    pub db_path: PathBuf,
    /// Per-request timeout; requests wait indefinitely when unset
    pub timeout: Option<Duration>,
    /// Subject selected at startup
    pub subject: Option<Subject>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_url = var(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                var: API_URL_VAR,
                value: api_url,
            });
        }

        let db_path = var(DB_PATH_VAR).map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.learning-assistant/storage.db"))
            },
            PathBuf::from,
        );

        let timeout = match var(TIMEOUT_VAR) {
            None => None,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: TIMEOUT_VAR,
                        value,
                    })
                }
            },
        };

        let subject = var(SUBJECT_VAR).map(|s| Subject::new(s.trim()));

        Ok(Self {
            api_url,
            db_path,
            timeout,
            subject,
        })
    }
}
