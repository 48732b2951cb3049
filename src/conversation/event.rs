//! Events that can occur in a conversation

use super::effect::TimerKey;
use super::message::{MessageId, RequestId};
use crate::inference::InferenceError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    /// Send `text`; `message_id` becomes the id of the appended user message
    Submit {
        text: String,
        message_id: MessageId,
    },
    /// Send whatever is currently in the draft
    SubmitDraft {
        message_id: MessageId,
    },
    SetDraft {
        text: String,
    },
    Delete {
        message_id: MessageId,
    },
    Undo {
        message_id: MessageId,
    },
    Edit {
        message_id: MessageId,
    },
    Reply {
        message_id: MessageId,
    },
    Copy {
        message_id: MessageId,
    },
    Share {
        text: String,
    },
    Speak {
        message_id: MessageId,
    },

    // Inference events
    ReplyReceived {
        request_id: RequestId,
        /// Id for the assistant message about to be appended
        message_id: MessageId,
        outcome: Result<String, InferenceError>,
    },

    // Timer events
    TimerFired {
        key: TimerKey,
        /// Runtime bookkeeping; lets the executor drop fires from replaced timers
        generation: u64,
    },
}
