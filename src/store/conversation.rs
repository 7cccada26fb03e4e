//! Ordered message history

use super::message::{ChatMessage, MessageId};

/// A message together with its stable id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub id: MessageId,
    pub message: ChatMessage,
}

/// Insertion-ordered sequence of messages.
///
/// Entries are only ever appended or enriched in place; positions never change.
#[derive(Debug, Default)]
pub struct Conversation {
    entries: Vec<ConversationEntry>,
    next_id: u64,
    generation: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        self.entries.push(ConversationEntry { id, message });
        id
    }

    /// Drop every entry. Id allocation continues where it left off.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    /// Number of times this conversation has been cleared
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of a message in the sequence
    pub fn position(&self, id: MessageId) -> Option<usize> {
        // ids are allocated in push order, so entries stay sorted by id
        self.entries.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.position(id).map(|pos| &self.entries[pos].message)
    }

    /// Attach a deep explanation to an assistant message that has none yet
    pub fn enrich(&mut self, id: MessageId, explanation: String) -> bool {
        match self.position(id) {
            Some(pos) => self.entries[pos].message.set_deep_explanation(explanation),
            None => false,
        }
    }
}
