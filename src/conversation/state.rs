//! Conversation state

use super::message::{Message, MessageId, RequestId};
use std::collections::{BTreeSet, HashMap};

/// A message pulled out of the log for editing, kept until the edit resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    /// Position the message occupied before removal
    pub index: usize,
    pub message: Message,
}

/// Everything a chat session knows. Owned by exactly one runtime task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Chronological send/receive order
    pub messages: Vec<Message>,
    /// Not-yet-sent input text
    pub draft: String,
    /// Message the draft is quoting; may point at a message that no longer exists
    pub reply_target: Option<MessageId>,
    pub(crate) in_flight: BTreeSet<RequestId>,
    pub(crate) pending_undo: HashMap<MessageId, Message>,
    pub(crate) pending_edits: HashMap<MessageId, PendingEdit>,
    pub(crate) next_request: u64,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while at least one inference request has not completed
    pub fn is_awaiting_reply(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    /// A deleted message that can still be restored with undo
    pub fn pending_undo(&self, id: MessageId) -> Option<&Message> {
        self.pending_undo.get(&id)
    }

    pub fn pending_edit(&self, id: MessageId) -> Option<&PendingEdit> {
        self.pending_edits.get(&id)
    }

    pub(crate) fn contains_id(&self, id: MessageId) -> bool {
        self.message(id).is_some()
            || self.pending_undo.contains_key(&id)
            || self.pending_edits.contains_key(&id)
    }

    pub(crate) fn allocate_request(&mut self) -> RequestId {
        self.next_request += 1;
        let id = RequestId(self.next_request);
        self.in_flight.insert(id);
        id
    }
}
