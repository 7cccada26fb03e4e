//! Mock implementations for testing
//!
//! These mocks enable controller testing without real I/O.

use super::Clipboard;
use crate::gateway::{
    AskRequest, AskResponse, AuthResponse, DeleteHistoryResponse, Gateway, GatewayError,
    HistoryRecord,
};
use crate::store::UserId;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Gateway
// ============================================================================

/// Mock gateway that returns queued answers
#[derive(Default)]
pub struct MockGateway {
    responses: Mutex<VecDeque<Result<AskResponse, GatewayError>>>,
    history: Mutex<Vec<HistoryRecord>>,
    account: Mutex<Option<AuthResponse>>,
    /// Record of all ask requests made
    pub requests: Mutex<Vec<AskRequest>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: AskResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a transport failure
    pub fn queue_error(&self, error: GatewayError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn with_history(self, records: Vec<HistoryRecord>) -> Self {
        *self.history.lock().unwrap() = records;
        self
    }

    /// Accept logins and signups for this account
    pub fn with_account(self, account: AuthResponse) -> Self {
        *self.account.lock().unwrap() = Some(account);
        self
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<AskRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<AskResponse, GatewayError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock response queued")))
    }

    fn account_for(&self, username: &str) -> Result<AuthResponse, GatewayError> {
        match self.account.lock().unwrap().clone() {
            Some(account) if account.username == username => Ok(account),
            _ => Err(GatewayError::auth("Invalid username or password").with_status(401)),
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }

    async fn fetch_history(
        &self,
        _user_id: UserId,
        _token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        let mut records = self.history.lock().unwrap().clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn fetch_history_for_date(
        &self,
        _user_id: UserId,
        date: NaiveDate,
        _token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        let mut records: Vec<HistoryRecord> = self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.day() == date)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn delete_history_for_date(
        &self,
        _user_id: UserId,
        date: NaiveDate,
        _token: Option<&str>,
    ) -> Result<DeleteHistoryResponse, GatewayError> {
        let mut history = self.history.lock().unwrap();
        let before = history.len();
        history.retain(|r| r.day() != date);
        let rows_deleted = (before - history.len()) as u64;
        Ok(DeleteHistoryResponse {
            success: true,
            message: format!("Deleted {rows_deleted} records for {date}"),
            rows_deleted: Some(rows_deleted),
            error: None,
        })
    }

    async fn login(&self, username: &str, _password: &str) -> Result<AuthResponse, GatewayError> {
        self.account_for(username)
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthResponse, GatewayError> {
        if password != confirm_password {
            return Err(
                GatewayError::invalid_request("Passwords do not match").with_status(400),
            );
        }
        self.account_for(username)
    }
}

// ============================================================================
// Gated Mock Gateway (for in-flight testing)
// ============================================================================

/// Mock gateway whose answers wait until the test releases them
pub struct GatedMockGateway {
    inner: MockGateway,
    /// Notified when a request reaches the gateway
    pub request_started: Arc<Notify>,
    /// Notify once per request to let it complete
    pub release: Arc<Notify>,
}

impl GatedMockGateway {
    pub fn new() -> Self {
        Self {
            inner: MockGateway::new(),
            request_started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, response: AskResponse) {
        self.inner.queue_response(response);
    }

    pub fn recorded_requests(&self) -> Vec<AskRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl Gateway for GatedMockGateway {
    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, GatewayError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.request_started.notify_one();
        self.release.notified().await;
        self.inner.next_response()
    }

    async fn fetch_history(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        self.inner.fetch_history(user_id, token).await
    }

    async fn fetch_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, GatewayError> {
        self.inner.fetch_history_for_date(user_id, date, token).await
    }

    async fn delete_history_for_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
        token: Option<&str>,
    ) -> Result<DeleteHistoryResponse, GatewayError> {
        self.inner.delete_history_for_date(user_id, date, token).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        self.inner.login(username, password).await
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthResponse, GatewayError> {
        self.inner.signup(username, password, confirm_password).await
    }
}

// ============================================================================
// Mock Clipboard
// ============================================================================

#[derive(Default)]
pub struct MockClipboard {
    pub fail: bool,
    pub copied: Mutex<Vec<String>>,
}

impl Clipboard for MockClipboard {
    fn write_text(&self, text: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        self.copied.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ConversationController;
    use crate::state_machine::{NO_RESPONSE_TEXT, REQUEST_FAILED_TEXT};
    use crate::store::{ChatMessage, MessageId, Role, SessionStore, StoreEvent};

    fn logged_in_store() -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::new());
        store.login(UserId(42), "tok-42", "ada");
        store
    }

    fn controller_with<G: Gateway>(gateway: G) -> ConversationController<G> {
        ConversationController::new(logged_in_store(), gateway)
    }

    fn transcript<G: Gateway>(controller: &ConversationController<G>) -> Vec<ChatMessage> {
        controller
            .store()
            .messages()
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    /// Seed an answered exchange and return the assistant message id
    fn seed_answer(store: &SessionStore, answer: &str, question: &str) -> MessageId {
        store.add_message(ChatMessage::user(question));
        store.add_message(ChatMessage::answer(answer, question))
    }

    #[tokio::test]
    async fn test_answer_records_question() {
        let controller = controller_with(MockGateway::new());
        controller.gateway().queue_response(AskResponse::answer("42"));

        assert!(!controller.is_pending());
        controller.submit_question("What is the answer?").await;
        assert!(!controller.is_pending());

        assert_eq!(
            transcript(&controller),
            vec![
                ChatMessage::user("What is the answer?"),
                ChatMessage::answer("42", "What is the answer?"),
            ]
        );

        let requests = controller.gateway().recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_id, UserId(42));
        assert_eq!(requests[0].token.as_deref(), Some("tok-42"));
        assert!(!requests[0].deep);
    }

    #[tokio::test]
    async fn test_question_is_trimmed_and_uses_active_subject() {
        let controller = controller_with(MockGateway::new());
        controller.store().set_subject("Machine Learning");
        controller.gateway().queue_response(AskResponse::answer("a"));

        controller.submit_question("  what is a tensor?\n").await;

        let requests = controller.gateway().recorded_requests();
        assert_eq!(requests[0].question, "what is a tensor?");
        assert_eq!(requests[0].subject.as_str(), "Machine Learning");
        assert_eq!(transcript(&controller)[0], ChatMessage::user("what is a tensor?"));
    }

    #[tokio::test]
    async fn test_reported_error_shown_verbatim() {
        let controller = controller_with(MockGateway::new());
        controller
            .gateway()
            .queue_response(AskResponse::error("rate limited"));

        controller.submit_question("q").await;

        let messages = transcript(&controller);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], ChatMessage::assistant("rate limited"));
        assert_eq!(messages[1].question(), None);
    }

    #[tokio::test]
    async fn test_empty_response_fallback() {
        let controller = controller_with(MockGateway::new());
        controller.gateway().queue_response(AskResponse::empty());

        controller.submit_question("q").await;

        assert_eq!(transcript(&controller)[1].content(), NO_RESPONSE_TEXT);
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn test_gateway_failure_fallback() {
        let controller = controller_with(MockGateway::new());
        controller
            .gateway()
            .queue_error(GatewayError::network("connection refused"));

        controller.submit_question("q").await;

        let messages = transcript(&controller);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role(), Role::Assistant);
        assert_eq!(messages[1].content(), REQUEST_FAILED_TEXT);
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let controller = controller_with(MockGateway::new());

        controller.submit_question("   ").await;

        assert_eq!(controller.store().message_count(), 0);
        assert!(controller.gateway().recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_logout_then_submit_is_noop() {
        let controller = controller_with(MockGateway::new());
        controller.store().logout();

        controller.submit_question("anyone there?").await;

        assert_eq!(controller.store().message_count(), 0);
        assert!(controller.gateway().recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_user_message_appears_before_answer() {
        let controller = controller_with(GatedMockGateway::new());
        controller.gateway().queue_response(AskResponse::answer("later"));
        let started = controller.gateway().request_started.clone();
        let release = controller.gateway().release.clone();

        tokio::join!(controller.submit_question("first"), async {
            started.notified().await;
            assert!(controller.is_pending());
            assert_eq!(transcript(&controller), vec![ChatMessage::user("first")]);

            // A second question while one is in flight is dropped
            controller.submit_question("second").await;
            assert_eq!(controller.store().message_count(), 1);

            release.notify_one();
        });

        assert!(!controller.is_pending());
        assert_eq!(controller.gateway().recorded_requests().len(), 1);
        assert_eq!(
            transcript(&controller),
            vec![
                ChatMessage::user("first"),
                ChatMessage::answer("later", "first"),
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_submit_clears_pending() {
        let controller = controller_with(GatedMockGateway::new());
        let started = controller.gateway().request_started.clone();

        {
            let submit = controller.submit_question("abandoned");
            tokio::pin!(submit);
            tokio::select! {
                () = &mut submit => panic!("gateway should still be waiting"),
                () = started.notified() => {}
            }
            assert!(controller.is_pending());
        }

        assert!(!controller.is_pending());
        let messages = transcript(&controller);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content(), REQUEST_FAILED_TEXT);
    }

    #[tokio::test]
    async fn test_answer_after_clear_is_discarded() {
        let controller = controller_with(GatedMockGateway::new());
        controller.gateway().queue_response(AskResponse::answer("late"));
        let started = controller.gateway().request_started.clone();
        let release = controller.gateway().release.clone();

        tokio::join!(controller.submit_question("old q"), async {
            started.notified().await;
            controller.store().clear_messages();
            controller.store().add_message(ChatMessage::user("fresh"));
            release.notify_one();
        });

        assert!(!controller.is_pending());
        assert_eq!(transcript(&controller), vec![ChatMessage::user("fresh")]);

        // The next question goes through normally
        controller.gateway().queue_response(AskResponse::answer("now"));
        tokio::join!(controller.submit_question("new q"), async {
            started.notified().await;
            release.notify_one();
        });
        assert_eq!(
            transcript(&controller),
            vec![
                ChatMessage::user("fresh"),
                ChatMessage::user("new q"),
                ChatMessage::answer("now", "new q"),
            ]
        );
    }

    #[tokio::test]
    async fn test_events_published_in_order() {
        let controller = controller_with(MockGateway::new());
        controller.gateway().queue_response(AskResponse::answer("42"));
        let mut events = controller.store().subscribe();

        controller.submit_question("q").await;

        let user_id = controller.store().message_id_at(0).unwrap();
        let answer_id = controller.store().message_id_at(1).unwrap();
        let mut seen = vec![];
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                StoreEvent::MessageAppended(user_id),
                StoreEvent::AskPending(true),
                StoreEvent::MessageAppended(answer_id),
                StoreEvent::AskPending(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_deep_explanation_enriches_in_place() {
        let controller = controller_with(MockGateway::new());
        let id = seed_answer(controller.store(), "42", "What is the answer?");
        controller
            .gateway()
            .queue_response(AskResponse::answer("42").with_deep_explanation("Think of it as..."));

        controller.request_deep_explanation(id).await;

        let message = controller.store().message(id).unwrap();
        assert_eq!(message.content(), "42");
        assert_eq!(message.deep_explanation(), Some("Think of it as..."));
        assert_eq!(controller.store().position_of(id), Some(1));
        assert!(!controller.is_deep_loading(id));

        let requests = controller.gateway().recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].deep);
        assert_eq!(requests[0].question, "What is the answer?");

        // Already explained: no further calls
        controller.request_deep_explanation(id).await;
        assert_eq!(controller.gateway().recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_deep_explanation_falls_back_to_answer_field() {
        let controller = controller_with(MockGateway::new());
        let id = seed_answer(controller.store(), "short", "why?");
        controller
            .gateway()
            .queue_response(AskResponse::answer("a longer story"));

        controller.request_deep_explanation(id).await;

        assert_eq!(
            controller.store().message(id).unwrap().deep_explanation(),
            Some("a longer story")
        );
    }

    #[tokio::test]
    async fn test_concurrent_deep_requests_call_gateway_once() {
        let controller = controller_with(GatedMockGateway::new());
        let id = seed_answer(controller.store(), "42", "What is the answer?");
        controller
            .gateway()
            .queue_response(AskResponse::empty().with_deep_explanation("deeper"));
        let started = controller.gateway().request_started.clone();
        let release = controller.gateway().release.clone();

        tokio::join!(controller.request_deep_explanation(id), async {
            started.notified().await;
            assert!(controller.is_deep_loading(id));
            controller.request_deep_explanation(id).await;
            release.notify_one();
        });

        assert_eq!(controller.gateway().recorded_requests().len(), 1);
        assert!(!controller.is_deep_loading(id));
        assert_eq!(
            controller.store().message(id).unwrap().deep_explanation(),
            Some("deeper")
        );
    }

    #[tokio::test]
    async fn test_deep_failure_leaves_message_unchanged() {
        let controller = controller_with(MockGateway::new());
        let id = seed_answer(controller.store(), "42", "q");
        controller
            .gateway()
            .queue_error(GatewayError::server_error("boom").with_status(500));
        controller.gateway().queue_response(AskResponse {
            answer: Some("42".to_string()),
            error: Some("Could not generate deep explanation".to_string()),
            ..AskResponse::default()
        });
        controller.gateway().queue_response(AskResponse::empty());

        for _ in 0..3 {
            controller.request_deep_explanation(id).await;
            assert_eq!(controller.store().message(id).unwrap().deep_explanation(), None);
            assert!(!controller.is_deep_loading(id));
        }
        assert_eq!(controller.store().message_count(), 2);

        // A later manual retry may still succeed
        controller
            .gateway()
            .queue_response(AskResponse::empty().with_deep_explanation("finally"));
        controller.request_deep_explanation(id).await;
        assert_eq!(
            controller.store().message(id).unwrap().deep_explanation(),
            Some("finally")
        );
    }

    #[tokio::test]
    async fn test_deep_request_preconditions() {
        let controller = controller_with(MockGateway::new());
        let store = controller.store();
        let user = store.add_message(ChatMessage::user("q"));
        let fallback = store.add_message(ChatMessage::assistant(REQUEST_FAILED_TEXT));
        let missing = MessageId::new(99);

        controller.request_deep_explanation(user).await;
        controller.request_deep_explanation(fallback).await;
        controller.request_deep_explanation(missing).await;

        assert!(controller.gateway().recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_deep_loading_events() {
        let controller = controller_with(MockGateway::new());
        let id = seed_answer(controller.store(), "42", "q");
        controller
            .gateway()
            .queue_response(AskResponse::empty().with_deep_explanation("deeper"));
        let mut events = controller.store().subscribe();

        controller.request_deep_explanation(id).await;

        let mut seen = vec![];
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                StoreEvent::DeepLoading { id, loading: true },
                StoreEvent::MessageEnriched(id),
                StoreEvent::DeepLoading { id, loading: false },
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_deep_request_clears_loading() {
        let controller = controller_with(GatedMockGateway::new());
        let id = seed_answer(controller.store(), "42", "q");
        let started = controller.gateway().request_started.clone();
        let release = controller.gateway().release.clone();
        let mut events = controller.store().subscribe();

        {
            let deep = controller.request_deep_explanation(id);
            tokio::pin!(deep);
            tokio::select! {
                () = &mut deep => panic!("gateway should still be waiting"),
                () = started.notified() => {}
            }
            assert!(controller.is_deep_loading(id));
        }

        assert!(!controller.is_deep_loading(id));
        assert_eq!(controller.store().message(id).unwrap().deep_explanation(), None);
        let mut seen = vec![];
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                StoreEvent::DeepLoading { id, loading: true },
                StoreEvent::DeepLoading { id, loading: false },
            ]
        );

        // The message can be explained again
        controller
            .gateway()
            .queue_response(AskResponse::empty().with_deep_explanation("second try"));
        tokio::join!(controller.request_deep_explanation(id), async {
            started.notified().await;
            release.notify_one();
        });
        assert_eq!(controller.gateway().recorded_requests().len(), 2);
        assert_eq!(
            controller.store().message(id).unwrap().deep_explanation(),
            Some("second try")
        );
    }

    #[tokio::test]
    async fn test_explanation_after_clear_is_discarded() {
        let controller = controller_with(GatedMockGateway::new());
        let id = seed_answer(controller.store(), "42", "q");
        controller
            .gateway()
            .queue_response(AskResponse::empty().with_deep_explanation("too late"));
        let started = controller.gateway().request_started.clone();
        let release = controller.gateway().release.clone();

        tokio::join!(controller.request_deep_explanation(id), async {
            started.notified().await;
            controller.store().clear_messages();
            controller.store().add_message(ChatMessage::user("fresh"));
            release.notify_one();
        });

        assert!(!controller.is_deep_loading(id));
        assert_eq!(transcript(&controller), vec![ChatMessage::user("fresh")]);
    }

    #[tokio::test]
    async fn test_deep_request_does_not_block_asking() {
        let controller = controller_with(GatedMockGateway::new());
        let id = seed_answer(controller.store(), "42", "q");
        let started = controller.gateway().request_started.clone();
        let release = controller.gateway().release.clone();
        controller
            .gateway()
            .queue_response(AskResponse::empty().with_deep_explanation("deeper"));
        controller.gateway().queue_response(AskResponse::answer("second answer"));

        tokio::join!(controller.request_deep_explanation(id), async {
            started.notified().await;
            assert!(!controller.is_pending());
            tokio::join!(controller.submit_question("another"), async {
                started.notified().await;
                assert!(controller.is_pending());
                // Both requests are parked on the gate now
                release.notify_waiters();
            });
        });

        assert_eq!(controller.gateway().recorded_requests().len(), 2);
        assert_eq!(controller.store().message_count(), 4);
    }

    #[tokio::test]
    async fn test_replayed_history_can_be_explained() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = |id: i64, hour: u32| HistoryRecord {
            id,
            question: format!("question {id}"),
            answer: format!("answer {id}"),
            subject: Some("Machine Learning".to_string()),
            date: None,
            created_at: day.and_hms_opt(hour, 0, 0).unwrap(),
        };
        let gateway = MockGateway::new()
            .with_history(vec![record(2, 18), record(1, 9)])
            .with_account(AuthResponse {
                success: true,
                user_id: UserId(42),
                token: "tok-42".to_string(),
                username: "ada".to_string(),
            });
        let controller = ConversationController::new(Arc::new(SessionStore::new()), gateway);

        let account = controller.gateway().login("ada", "pw").await.unwrap();
        controller
            .store()
            .login(account.user_id, account.token, account.username);
        assert!(controller.gateway().login("bob", "pw").await.is_err());

        let records = controller
            .gateway()
            .fetch_history_for_date(UserId(42), day, Some("tok-42"))
            .await
            .unwrap();
        for message in crate::history::transcript(&records) {
            controller.store().add_message(message);
        }
        let first_answer = controller.store().message_id_at(1).unwrap();
        assert_eq!(
            controller.store().message(first_answer).unwrap().question(),
            Some("question 1")
        );

        controller
            .gateway()
            .queue_response(AskResponse::empty().with_deep_explanation("replayed"));
        controller.request_deep_explanation(first_answer).await;
        assert_eq!(
            controller.store().message(first_answer).unwrap().deep_explanation(),
            Some("replayed")
        );
        assert_eq!(
            controller.gateway().recorded_requests()[0].question,
            "question 1"
        );

        let deleted = controller
            .gateway()
            .delete_history_for_date(UserId(42), day, Some("tok-42"))
            .await
            .unwrap();
        assert_eq!(deleted.rows_deleted, Some(2));
        assert!(controller
            .gateway()
            .fetch_history(UserId(42), None)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_copy_message() {
        let controller = controller_with(MockGateway::new());
        let id = controller
            .store()
            .add_message(ChatMessage::answer("copy me", "q"));

        let clipboard = MockClipboard::default();
        assert!(controller.copy_message(id, &clipboard));
        assert_eq!(*clipboard.copied.lock().unwrap(), vec!["copy me".to_string()]);

        let broken = MockClipboard {
            fail: true,
            ..MockClipboard::default()
        };
        assert!(!controller.copy_message(id, &broken));
        assert!(!controller.copy_message(MessageId::new(7), &clipboard));
    }
}
