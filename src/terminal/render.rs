//! Text rendering of store changes

use crate::history::HistoryDay;
use crate::store::{ChatMessage, MessageId, Role, SessionStore, StoreEvent, Subject};

/// Line(s) to print for a store change, if any
pub fn describe(store: &SessionStore, event: &StoreEvent) -> Option<String> {
    match event {
        StoreEvent::MessageAppended(id) => {
            let message = store.message(*id)?;
            Some(format_message(number(store, *id)?, &message))
        }
        StoreEvent::MessageEnriched(id) => {
            let message = store.message(*id)?;
            let explanation = message.deep_explanation()?;
            Some(format!(
                "[{}] deep explanation:\n{}",
                number(store, *id)?,
                indent(explanation)
            ))
        }
        StoreEvent::DeepLoading { id, loading: true } => {
            Some(format!("[{}] explaining...", number(store, *id)?))
        }
        StoreEvent::AskPending(true) => Some("thinking...".to_string()),
        StoreEvent::SubjectChanged(subject) => Some(format!("Subject: {subject}")),
        StoreEvent::SidebarChanged(true) => Some(format_menu(&store.subject())),
        StoreEvent::ConversationCleared => Some("New chat started.".to_string()),
        StoreEvent::SessionChanged { logged_in: false } => Some("Logged out.".to_string()),
        StoreEvent::SessionChanged { logged_in: true } => {
            Some(format!("Logged in as {}.", store.username()))
        }
        StoreEvent::DeepLoading { loading: false, .. }
        | StoreEvent::AskPending(false)
        | StoreEvent::SidebarChanged(false) => None,
    }
}

/// One-based display number of a message
fn number(store: &SessionStore, id: MessageId) -> Option<usize> {
    store.position_of(id).map(|p| p + 1)
}

pub fn format_message(number: usize, message: &ChatMessage) -> String {
    let speaker = match message.role() {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let mut text = format!("[{number}] {speaker}:\n{}", indent(message.content()));
    if let Some(explanation) = message.deep_explanation() {
        text.push_str("\n    deep explanation:\n");
        text.push_str(&indent(explanation));
    }
    text
}

pub fn format_menu(active: &Subject) -> String {
    let mut text = String::from("Menu\n");
    for subject in Subject::known() {
        let marker = if &subject == active { '*' } else { ' ' };
        text.push_str(&format!("  {marker} /subject {subject}\n"));
    }
    text.push_str("    /new  /history  /logout");
    text
}

pub fn format_history(days: &[HistoryDay]) -> String {
    if days.is_empty() {
        return "No history yet.".to_string();
    }
    days.iter()
        .map(|day| {
            let subjects = day.subjects().join(", ");
            let count = day.count();
            let noun = if count == 1 { "question" } else { "questions" };
            format!(
                "{}  {count} {noun}  [{subjects}]  {}",
                day.date,
                day.preview().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
