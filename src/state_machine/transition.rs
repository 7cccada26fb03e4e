//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result. Store mutation and gateway calls are left to the controller, which
//! executes the returned effects.

use super::event::{AnswerOutcome, ExplanationOutcome};
use super::state::AskState;
use super::{ConvContext, ConvState, Effect, Event};
use crate::gateway::AskRequest;
use crate::store::{ChatMessage, MessageId};
use thiserror::Error;

/// Assistant text when the service answered with neither answer nor error
pub const NO_RESPONSE_TEXT: &str = "No response received. Please try again.";

/// Assistant text when the request itself failed
pub const REQUEST_FAILED_TEXT: &str = "An error occurred. Please try again.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event is ignored
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Question is empty")]
    EmptyQuestion,
    #[error("A question is already being answered")]
    AskInFlight,
    #[error("No user is logged in")]
    NotAuthenticated,
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),
    #[error("Message cannot be explained: {0}")]
    NotExplainable(MessageId),
    #[error("Message already has a deep explanation: {0}")]
    AlreadyExplained(MessageId),
    #[error("Deep explanation already in progress: {0}")]
    ExplanationInFlight(MessageId),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::Submit { question } => submit(state, context, &question),
        Event::AnswerSettled { outcome } => settle_answer(state, context, outcome),
        Event::DeepRequested { id, message } => {
            request_explanation(state, context, id, message.as_ref())
        }
        Event::ExplanationSettled { id, outcome } => settle_explanation(state, id, outcome),
    }
}

// ============================================================
// Question / answer
// ============================================================

fn submit(
    state: &ConvState,
    context: &ConvContext,
    question: &str,
) -> Result<TransitionResult, TransitionError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(TransitionError::EmptyQuestion);
    }
    if state.is_pending() {
        return Err(TransitionError::AskInFlight);
    }
    let session = context
        .session
        .as_ref()
        .ok_or(TransitionError::NotAuthenticated)?;

    let request = AskRequest {
        user_id: session.user_id,
        subject: context.subject.clone(),
        question: question.to_string(),
        deep: false,
        token: session.token.clone(),
    };
    let new_state = ConvState {
        ask: AskState::Pending {
            question: question.to_string(),
            generation: context.generation,
        },
        deep_pending: state.deep_pending.clone(),
    };

    // User message goes in before the request is made
    Ok(TransitionResult::new(new_state)
        .with_effect(Effect::append_user(question))
        .with_effect(Effect::NotifyAskPending(true))
        .with_effect(Effect::RequestAnswer(request)))
}

fn settle_answer(
    state: &ConvState,
    context: &ConvContext,
    outcome: AnswerOutcome,
) -> Result<TransitionResult, TransitionError> {
    let AskState::Pending {
        question,
        generation,
    } = &state.ask
    else {
        return Err(TransitionError::InvalidTransition(
            "answer settled with no question pending".to_string(),
        ));
    };
    let new_state = ConvState {
        ask: AskState::Idle,
        deep_pending: state.deep_pending.clone(),
    };

    // The chat the question went into was cleared; its answer has nowhere to go
    if *generation != context.generation {
        return Ok(TransitionResult::new(new_state).with_effect(Effect::NotifyAskPending(false)));
    }

    let reply = match outcome {
        AnswerOutcome::Answered(answer) => Effect::append_answer(answer, question.clone()),
        AnswerOutcome::Reported(error) => Effect::append_assistant(error),
        AnswerOutcome::Empty => Effect::append_assistant(NO_RESPONSE_TEXT),
        AnswerOutcome::Failed(_) => Effect::append_assistant(REQUEST_FAILED_TEXT),
    };

    Ok(TransitionResult::new(new_state)
        .with_effect(reply)
        .with_effect(Effect::NotifyAskPending(false)))
}

// ============================================================
// Deep explanation
// ============================================================

fn request_explanation(
    state: &ConvState,
    context: &ConvContext,
    id: MessageId,
    message: Option<&ChatMessage>,
) -> Result<TransitionResult, TransitionError> {
    if state.is_deep_pending(id) {
        return Err(TransitionError::ExplanationInFlight(id));
    }
    let Some(ChatMessage::Assistant {
        content,
        question,
        deep_explanation,
    }) = message
    else {
        return Err(match message {
            None => TransitionError::MessageNotFound(id),
            Some(_) => TransitionError::NotExplainable(id),
        });
    };
    if deep_explanation.is_some() {
        return Err(TransitionError::AlreadyExplained(id));
    }
    if content.trim().is_empty() {
        return Err(TransitionError::NotExplainable(id));
    }
    let question = question
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .ok_or(TransitionError::NotExplainable(id))?;
    let session = context
        .session
        .as_ref()
        .ok_or(TransitionError::NotAuthenticated)?;

    let request = AskRequest {
        user_id: session.user_id,
        subject: context.subject.clone(),
        question: question.to_string(),
        deep: true,
        token: session.token.clone(),
    };
    let mut new_state = state.clone();
    new_state.deep_pending.insert(id);

    Ok(TransitionResult::new(new_state)
        .with_effect(Effect::NotifyDeepLoading { id, loading: true })
        .with_effect(Effect::RequestExplanation { id, request }))
}

fn settle_explanation(
    state: &ConvState,
    id: MessageId,
    outcome: ExplanationOutcome,
) -> Result<TransitionResult, TransitionError> {
    if !state.is_deep_pending(id) {
        return Err(TransitionError::InvalidTransition(format!(
            "explanation settled for {id} with no request pending"
        )));
    }
    let mut new_state = state.clone();
    new_state.deep_pending.remove(&id);

    let mut result = TransitionResult::new(new_state);
    if let ExplanationOutcome::Explained(explanation) = outcome {
        result = result.with_effect(Effect::EnrichMessage { id, explanation });
    }
    Ok(result.with_effect(Effect::NotifyDeepLoading { id, loading: false }))
}
