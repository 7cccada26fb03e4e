//! Session store
//!
//! Single source of truth for identity, active subject, sidebar visibility and
//! the conversation. Constructed once and shared by `Arc`; every mutation goes
//! through the methods below and is broadcast to subscribers.

mod conversation;
mod message;
mod session;

pub use conversation::{Conversation, ConversationEntry};
pub use message::{ChatMessage, MessageId, Role};
pub use session::{Session, Subject, UserId, DEFAULT_SUBJECT, KNOWN_SUBJECTS};

use crate::state_machine::ConvContext;
use crate::storage::SessionPersistence;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

/// Change notifications for interaction surfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    SessionChanged { logged_in: bool },
    SubjectChanged(Subject),
    SidebarChanged(bool),
    MessageAppended(MessageId),
    MessageEnriched(MessageId),
    ConversationCleared,
    /// A question/answer exchange started or settled
    AskPending(bool),
    /// Deep explanation loading indicator for one message
    DeepLoading { id: MessageId, loading: bool },
}

#[derive(Debug, Default)]
struct StoreState {
    session: Option<Session>,
    subject: Subject,
    sidebar_open: bool,
    conversation: Conversation,
}

pub struct SessionStore {
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an empty, logged-out store
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(StoreState::default()),
            events,
            persistence: None,
        }
    }

    /// Create a store that restores and saves identity through `persistence`
    pub fn with_persistence(persistence: Arc<dyn SessionPersistence>) -> Self {
        let mut store = Self::new();
        match persistence.load() {
            Ok(Some(session)) => {
                tracing::info!(user_id = %session.user_id, "Restored saved session");
                store.write().session = Some(session);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to restore saved session"),
        }
        store.persistence = Some(persistence);
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Receive every subsequent change
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ==================== Identity ====================

    pub fn login(&self, user_id: UserId, token: impl Into<String>, username: impl Into<String>) {
        let session = Session::new(user_id, token, username);
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save(&session) {
                tracing::warn!(error = %e, "Failed to save session");
            }
        }
        tracing::info!(user_id = %user_id, "Logged in");
        self.write().session = Some(session);
        self.publish(StoreEvent::SessionChanged { logged_in: true });
    }

    /// Forget the identity. Messages stay; the sidebar closes.
    pub fn logout(&self) {
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.clear() {
                tracing::warn!(error = %e, "Failed to clear saved session");
            }
        }
        let was_open = {
            let mut state = self.write();
            state.session = None;
            std::mem::replace(&mut state.sidebar_open, false)
        };
        tracing::info!("Logged out");
        self.publish(StoreEvent::SessionChanged { logged_in: false });
        if was_open {
            self.publish(StoreEvent::SidebarChanged(false));
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.read().session.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.read().session.is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.read().session.as_ref().map(|s| s.user_id)
    }

    pub fn token(&self) -> Option<String> {
        self.read().session.as_ref().and_then(|s| s.token.clone())
    }

    /// Display name, empty when logged out
    pub fn username(&self) -> String {
        self.read()
            .session
            .as_ref()
            .map(|s| s.username.clone())
            .unwrap_or_default()
    }

    // ==================== Subject ====================

    /// Switch the active subject. History is left untouched.
    pub fn set_subject(&self, subject: impl Into<Subject>) {
        let subject = subject.into();
        self.write().subject = subject.clone();
        self.publish(StoreEvent::SubjectChanged(subject));
    }

    pub fn subject(&self) -> Subject {
        self.read().subject.clone()
    }

    // ==================== Sidebar ====================

    pub fn set_sidebar_open(&self, open: bool) {
        self.write().sidebar_open = open;
        self.publish(StoreEvent::SidebarChanged(open));
    }

    pub fn toggle_sidebar(&self) -> bool {
        let open = {
            let mut state = self.write();
            state.sidebar_open = !state.sidebar_open;
            state.sidebar_open
        };
        self.publish(StoreEvent::SidebarChanged(open));
        open
    }

    pub fn sidebar_open(&self) -> bool {
        self.read().sidebar_open
    }

    // ==================== Conversation ====================

    pub fn add_message(&self, message: ChatMessage) -> MessageId {
        let id = self.write().conversation.push(message);
        self.publish(StoreEvent::MessageAppended(id));
        id
    }

    /// Start a new chat
    pub fn clear_messages(&self) {
        self.write().conversation.clear();
        self.publish(StoreEvent::ConversationCleared);
    }

    pub(crate) fn enrich_message(&self, id: MessageId, explanation: String) -> bool {
        let enriched = self.write().conversation.enrich(id, explanation);
        if enriched {
            self.publish(StoreEvent::MessageEnriched(id));
        }
        enriched
    }

    /// Snapshot of the conversation in order
    pub fn messages(&self) -> Vec<ConversationEntry> {
        self.read().conversation.entries().to_vec()
    }

    pub fn message(&self, id: MessageId) -> Option<ChatMessage> {
        self.read().conversation.get(id).cloned()
    }

    /// Id of the message at a zero-based position
    pub fn message_id_at(&self, position: usize) -> Option<MessageId> {
        self.read().conversation.entries().get(position).map(|e| e.id)
    }

    pub fn position_of(&self, id: MessageId) -> Option<usize> {
        self.read().conversation.position(id)
    }

    pub fn message_count(&self) -> usize {
        self.read().conversation.len()
    }

    /// Read-only view handed to state transitions
    pub(crate) fn context(&self) -> ConvContext {
        let state = self.read();
        ConvContext {
            session: state.session.clone(),
            subject: state.subject.clone(),
            generation: state.conversation.generation(),
        }
    }
}
