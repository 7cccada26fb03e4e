//! Learning assistant client core
//!
//! Session and conversation state for a subject-scoped question answering
//! service: a shared [`store::SessionStore`], a [`controller::ConversationController`]
//! driven by a pure state machine, and a [`gateway::Gateway`] to the remote
//! service.

pub mod config;
pub mod controller;
pub mod gateway;
pub mod history;
pub mod routes;
pub mod state_machine;
pub mod storage;
pub mod store;
pub mod terminal;
