//! Effects produced by state transitions

use super::message::{MessageId, RequestId};
use std::time::Duration;

/// Delayed work, keyed by the message it concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Ask the user whether to undo a delete
    UndoOffer(MessageId),
    /// Forget a deleted message for good
    UndoExpiry(MessageId),
    /// Roll back an edit whose draft was left empty
    EditDeadline(MessageId),
}

impl TimerKey {
    pub fn message_id(self) -> MessageId {
        match self {
            TimerKey::UndoOffer(id) | TimerKey::UndoExpiry(id) | TimerKey::EditDeadline(id) => id,
        }
    }
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the inference backend for a reply (runs in the background)
    RequestReply { request_id: RequestId, prompt: String },

    /// Start a timer, replacing any running timer with the same key
    ScheduleTimer { key: TimerKey, delay: Duration },

    CancelTimer { key: TimerKey },

    CopyToClipboard { text: String },

    PresentShare { text: String },

    /// Start speech playback, stopping any current utterance
    Speak { text: String },

    /// Haptic success feedback
    NotifySuccess,

    /// Present the undo prompt for a deleted message
    ConfirmUndo { message_id: MessageId, text: String },
}

impl Effect {
    pub fn schedule(key: TimerKey, delay: Duration) -> Self {
        Effect::ScheduleTimer { key, delay }
    }

    pub fn cancel(key: TimerKey) -> Self {
        Effect::CancelTimer { key }
    }
}
