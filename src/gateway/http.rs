//! HTTP implementation of the gateway

use super::{
    AskRequest, AskResponse, AuthResponse, DeleteHistoryResponse, Gateway, GatewayError,
    HistoryRecord,
};
use crate::store::UserId;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct AskBody<'a> {
    question: &'a str,
    subject: &'a str,
    user_id: UserId,
    request_deep_explanation: bool,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignupBody<'a> {
    username: &'a str,
    password: &'a str,
    confirm_password: &'a str,
}

/// Gateway talking JSON over HTTP to the answering service
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// `timeout` bounds each request; `None` waits indefinitely
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(GatewayError::from_status(
                status.as_u16(),
                error_detail(&body, status.canonical_reason()),
            ));
        }

        serde_json::from_slice(&body)
            .map_err(|e| GatewayError::decode(format!("Unexpected response body: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::network(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        GatewayError::network(format!("Connection failed: {e}"))
    } else if e.is_decode() {
        GatewayError::decode(e.to_string())
    } else {
        GatewayError::network(e.to_string())
    }
}

/// Pull the `detail` field out of an error body, falling back to the raw text
fn error_detail(body: &[u8], reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        reason.unwrap_or("Request failed").to_string()
    } else {
        text
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, GatewayError> {
        let body = AskBody {
            question: &request.question,
            subject: request.subject.as_str(),
            user_id: request.user_id,
            request_deep_explanation: request.deep,
        };
        let builder = self.client.post(self.url("/ask")).json(&body);
        Self::send(Self::authorize(builder, request.token.as_deref())).await
    }

    async fn fetch_history(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        let builder = self.client.get(self.url(&format!("/history/{user_id}")));
        Self::send(Self::authorize(builder, token)).await
    }

    async fn fetch_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        let builder = self
            .client
            .get(self.url(&format!("/history/{user_id}/{}", date.format("%Y-%m-%d"))));
        Self::send(Self::authorize(builder, token)).await
    }

    async fn delete_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<DeleteHistoryResponse, GatewayError> {
        let builder = self
            .client
            .delete(self.url(&format!("/history/{user_id}/{}", date.format("%Y-%m-%d"))));
        Self::send(Self::authorize(builder, token)).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        let builder = self
            .client
            .post(self.url("/login"))
            .json(&LoginBody { username, password });
        Self::send(builder).await
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthResponse, GatewayError> {
        let builder = self.client.post(self.url("/signup")).json(&SignupBody {
            username,
            password,
            confirm_password,
        });
        Self::send(builder).await
    }
}
