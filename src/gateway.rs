//! Remote gateway abstraction
//!
//! The question-answering and history service is an opaque asynchronous
//! boundary. The controller only depends on the [`Gateway`] trait.

mod error;
mod http;
mod types;

pub use error::{GatewayError, GatewayErrorKind};
pub use http::HttpGateway;
pub use types::*;

use crate::store::UserId;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;

/// Operations offered by the remote service
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Ask a question, or request a deep explanation when `request.deep` is set
    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, GatewayError>;

    /// Every stored record of a user, newest first
    async fn fetch_history(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError>;

    /// Records of a single day, oldest first
    async fn fetch_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError>;

    async fn delete_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<DeleteHistoryResponse, GatewayError>;

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, GatewayError>;

    async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthResponse, GatewayError>;
}

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for Arc<T> {
    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, GatewayError> {
        (**self).ask_question(request).await
    }

    async fn fetch_history(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        (**self).fetch_history(user_id, token).await
    }

    async fn fetch_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        (**self).fetch_history_for_date(user_id, date, token).await
    }

    async fn delete_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<DeleteHistoryResponse, GatewayError> {
        (**self).delete_history_for_date(user_id, date, token).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        (**self).login(username, password).await
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthResponse, GatewayError> {
        (**self).signup(username, password, confirm_password).await
    }
}

/// Logging wrapper for gateways
pub struct LoggingGateway {
    inner: Arc<dyn Gateway>,
}

impl LoggingGateway {
    pub fn new(inner: Arc<dyn Gateway>) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(operation: &str, started: Instant, result: &Result<T, GatewayError>) {
    let duration = started.elapsed();
    match result {
        Ok(_) => {
            tracing::info!(
                operation,
                duration_ms = %duration.as_millis(),
                "Gateway request completed"
            );
        }
        Err(e) => {
            tracing::error!(
                operation,
                duration_ms = %duration.as_millis(),
                error = %e.message,
                status = ?e.status,
                retryable = e.kind.is_retryable(),
                "Gateway request failed"
            );
        }
    }
}

#[async_trait]
impl Gateway for LoggingGateway {
    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, GatewayError> {
        let started = Instant::now();
        let result = self.inner.ask_question(request).await;
        log_outcome(if request.deep { "deep_explanation" } else { "ask" }, started, &result);
        if let Ok(response) = &result {
            tracing::debug!(
                subject = %request.subject,
                cached = ?response.cached,
                source = ?response.source,
                has_answer = response.answer_text().is_some(),
                has_error = response.reported_error().is_some(),
                "Answer received"
            );
        }
        result
    }

    async fn fetch_history(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        let started = Instant::now();
        let result = self.inner.fetch_history(user_id, token).await;
        log_outcome("fetch_history", started, &result);
        result
    }

    async fn fetch_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        let started = Instant::now();
        let result = self.inner.fetch_history_for_date(user_id, date, token).await;
        log_outcome("fetch_history_for_date", started, &result);
        result
    }

    async fn delete_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<DeleteHistoryResponse, GatewayError> {
        let started = Instant::now();
        let result = self.inner.delete_history_for_date(user_id, date, token).await;
        log_outcome("delete_history_for_date", started, &result);
        result
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        let started = Instant::now();
        let result = self.inner.login(username, password).await;
        log_outcome("login", started, &result);
        result
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthResponse, GatewayError> {
        let started = Instant::now();
        let result = self.inner.signup(username, password, confirm_password).await;
        log_outcome("signup", started, &result);
        result
    }
}
