//! Conversation controller
//!
//! Drives question/answer exchanges and deep explanations against a
//! [`Gateway`], recording every outcome in the shared [`SessionStore`].
//! Decisions come from the pure [`transition`] function; this module only
//! executes the resulting effects.

#[cfg(test)]
pub mod testing;

use crate::gateway::{AskRequest, Gateway};
use crate::state_machine::{
    transition, AnswerOutcome, ConvState, Effect, Event, ExplanationOutcome,
};
use crate::store::{MessageId, SessionStore, StoreEvent};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Destination for copied message text
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> io::Result<()>;
}

/// Gateway call produced by a transition
enum Call {
    Answer(AskRequest),
    Explanation { id: MessageId, request: AskRequest },
}

pub struct ConversationController<G: Gateway> {
    store: Arc<SessionStore>,
    gateway: G,
    state: Mutex<ConvState>,
}

impl<G: Gateway> ConversationController<G> {
    pub fn new(store: Arc<SessionStore>, gateway: G) -> Self {
        Self {
            store,
            gateway,
            state: Mutex::new(ConvState::default()),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Whether a question is awaiting its answer
    pub fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }

    /// Whether a deep explanation for `id` is in flight
    pub fn is_deep_loading(&self, id: MessageId) -> bool {
        self.lock().is_deep_pending(id)
    }

    /// Ask a question and append the answer once it arrives.
    ///
    /// Silently ignored when the question is blank, another question is in
    /// flight, or nobody is logged in.
    pub async fn submit_question(&self, question: &str) {
        let call = {
            let mut state = self.lock();
            self.apply(
                &mut state,
                Event::Submit {
                    question: question.to_string(),
                },
            )
        };
        let Some(Call::Answer(request)) = call else {
            return;
        };

        tracing::info!(
            user_id = %request.user_id,
            subject = %request.subject,
            "Submitting question"
        );
        let guard = SettleGuard::new(
            self,
            Event::AnswerSettled {
                outcome: AnswerOutcome::Failed("request dropped".to_string()),
            },
        );
        let result = self.gateway.ask_question(&request).await;
        guard.settle(Event::AnswerSettled {
            outcome: AnswerOutcome::from_result(result),
        });
    }

    /// Fetch a deep explanation for an assistant message and attach it.
    ///
    /// Silently ignored when the message cannot be explained, is already
    /// explained, or already has a request in flight.
    pub async fn request_deep_explanation(&self, id: MessageId) {
        let call = {
            let mut state = self.lock();
            // Snapshot under the state lock so a concurrent settle cannot interleave
            let message = self.store.message(id);
            self.apply(&mut state, Event::DeepRequested { id, message })
        };
        let Some(Call::Explanation { id, request }) = call else {
            return;
        };

        tracing::info!(message_id = %id, subject = %request.subject, "Requesting deep explanation");
        let guard = SettleGuard::new(
            self,
            Event::ExplanationSettled {
                id,
                outcome: ExplanationOutcome::Failed("request dropped".to_string()),
            },
        );
        let result = self.gateway.ask_question(&request).await;
        let outcome = ExplanationOutcome::from_result(result);
        match &outcome {
            ExplanationOutcome::Explained(_) => {}
            ExplanationOutcome::Reported(error) => {
                tracing::warn!(message_id = %id, error = %error, "Deep explanation refused");
            }
            ExplanationOutcome::Empty => {
                tracing::warn!(message_id = %id, "Deep explanation response was empty");
            }
            ExplanationOutcome::Failed(error) => {
                tracing::warn!(message_id = %id, error = %error, "Deep explanation failed");
            }
        }
        guard.settle(Event::ExplanationSettled { id, outcome });
    }

    /// Copy a message's content. Failures are reported only as `false`.
    pub fn copy_message(&self, id: MessageId, clipboard: &dyn Clipboard) -> bool {
        let Some(message) = self.store.message(id) else {
            tracing::debug!(message_id = %id, "Copy requested for missing message");
            return false;
        };
        match clipboard.write_text(message.content()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(message_id = %id, error = %e, "Copy failed");
                false
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConvState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, event: Event) -> Option<Call> {
        let mut state = self.lock();
        self.apply(&mut state, event)
    }

    /// Run the transition and execute its store effects. Returns the gateway
    /// call to make, if any. Must be called with the state lock held.
    fn apply(&self, state: &mut ConvState, event: Event) -> Option<Call> {
        let result = match transition(state, &self.store.context(), event) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(error = %e, "Event ignored");
                return None;
            }
        };
        *state = result.new_state;

        let mut call = None;
        for effect in result.effects {
            match effect {
                Effect::AppendMessage(message) => {
                    self.store.add_message(message);
                }
                Effect::EnrichMessage { id, explanation } => {
                    if !self.store.enrich_message(id, explanation) {
                        tracing::debug!(message_id = %id, "Explained message no longer exists");
                    }
                }
                Effect::NotifyAskPending(pending) => {
                    self.store.publish(StoreEvent::AskPending(pending));
                }
                Effect::NotifyDeepLoading { id, loading } => {
                    self.store.publish(StoreEvent::DeepLoading { id, loading });
                }
                Effect::RequestAnswer(request) => call = Some(Call::Answer(request)),
                Effect::RequestExplanation { id, request } => {
                    call = Some(Call::Explanation { id, request });
                }
            }
        }
        call
    }
}

/// Settles an outstanding request with its fallback event if the owning
/// future is dropped before the gateway answers.
struct SettleGuard<'a, G: Gateway> {
    controller: &'a ConversationController<G>,
    fallback: Option<Event>,
}

impl<'a, G: Gateway> SettleGuard<'a, G> {
    fn new(controller: &'a ConversationController<G>, fallback: Event) -> Self {
        Self {
            controller,
            fallback: Some(fallback),
        }
    }

    fn settle(mut self, event: Event) {
        self.fallback = None;
        self.controller.dispatch(event);
    }
}

impl<G: Gateway> Drop for SettleGuard<'_, G> {
    fn drop(&mut self) {
        if let Some(event) = self.fallback.take() {
            tracing::debug!("Request dropped before settling");
            self.controller.dispatch(event);
        }
    }
}
