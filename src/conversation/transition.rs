//! Pure state transition function
//!
//! Given the same state, timing and event it always yields the same result.
//! Message ids and request outcomes arrive inside events, so nothing here
//! touches the clock, the network or a random source.

use super::state::PendingEdit;
use super::{ConversationState, Effect, Event, Message, MessageId, RequestId, TimerKey};
use crate::config::TimingConfig;
use thiserror::Error;

/// Text shown in place of an assistant reply when inference fails
pub const FALLBACK_REPLY: &str = "no response received";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No in-flight request {0}")]
    UnknownRequest(RequestId),
    #[error("Message id {0} is already in use")]
    DuplicateMessageId(MessageId),
}

/// Pure transition function
pub fn transition(
    state: &ConversationState,
    timing: &TimingConfig,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::Submit { text, message_id } => submit(state, text, message_id),

        Event::SubmitDraft { message_id } => submit(state, state.draft.clone(), message_id),

        Event::SetDraft { text } => {
            let mut next = state.clone();
            next.draft = text;
            Ok(TransitionResult::new(next))
        }

        Event::ReplyReceived {
            request_id,
            message_id,
            outcome,
        } => {
            if !state.in_flight.contains(&request_id) {
                return Err(TransitionError::UnknownRequest(request_id));
            }
            if state.contains_id(message_id) {
                return Err(TransitionError::DuplicateMessageId(message_id));
            }

            let mut next = state.clone();
            next.in_flight.remove(&request_id);
            let text = outcome.unwrap_or_else(|_| FALLBACK_REPLY.to_string());
            next.messages.push(Message::assistant(message_id, text));
            Ok(TransitionResult::new(next))
        }

        Event::Delete { message_id } => {
            let Some(index) = state.position(message_id) else {
                return Ok(TransitionResult::new(state.clone()));
            };

            let mut next = state.clone();
            let removed = next.messages.remove(index);
            next.pending_undo.insert(message_id, removed);
            Ok(TransitionResult::new(next)
                .with_effect(Effect::schedule(
                    TimerKey::UndoOffer(message_id),
                    timing.undo_offer_delay,
                ))
                .with_effect(Effect::schedule(
                    TimerKey::UndoExpiry(message_id),
                    timing.undo_window,
                )))
        }

        Event::Undo { message_id } => {
            if !state.pending_undo.contains_key(&message_id) {
                return Ok(TransitionResult::new(state.clone()));
            }

            let mut next = state.clone();
            if let Some(restored) = next.pending_undo.remove(&message_id) {
                // Restored at the end, not at its old position
                next.messages.push(restored);
            }
            Ok(TransitionResult::new(next).with_effects([
                Effect::cancel(TimerKey::UndoOffer(message_id)),
                Effect::cancel(TimerKey::UndoExpiry(message_id)),
                Effect::NotifySuccess,
            ]))
        }

        Event::Edit { message_id } => {
            let Some(index) = state.position(message_id) else {
                return Ok(TransitionResult::new(state.clone()));
            };

            let mut next = state.clone();
            let message = next.messages.remove(index);
            next.draft.clone_from(&message.text);
            next.reply_target = None;
            next.pending_edits
                .insert(message_id, PendingEdit { index, message });
            Ok(TransitionResult::new(next).with_effect(Effect::schedule(
                TimerKey::EditDeadline(message_id),
                timing.edit_timeout,
            )))
        }

        Event::Reply { message_id } => {
            let Some(target) = state.message(message_id) else {
                return Ok(TransitionResult::new(state.clone()));
            };

            let mut next = state.clone();
            next.draft = quote(&target.text);
            next.reply_target = Some(message_id);
            Ok(TransitionResult::new(next))
        }

        Event::Copy { message_id } => Ok(match state.message(message_id) {
            Some(message) => TransitionResult::new(state.clone()).with_effects([
                Effect::CopyToClipboard {
                    text: message.text.clone(),
                },
                Effect::NotifySuccess,
            ]),
            None => TransitionResult::new(state.clone()),
        }),

        Event::Share { text } => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::PresentShare { text }))
        }

        Event::Speak { message_id } => Ok(match state.message(message_id) {
            Some(message) => TransitionResult::new(state.clone()).with_effect(Effect::Speak {
                text: message.text.clone(),
            }),
            None => TransitionResult::new(state.clone()),
        }),

        Event::TimerFired { key, .. } => Ok(timer_fired(state, key)),
    }
}

fn submit(
    state: &ConversationState,
    text: String,
    message_id: MessageId,
) -> Result<TransitionResult, TransitionError> {
    if text.trim().is_empty() {
        return Ok(TransitionResult::new(state.clone()));
    }
    if state.contains_id(message_id) {
        return Err(TransitionError::DuplicateMessageId(message_id));
    }

    let mut next = state.clone();
    next.messages.push(Message::user(message_id, text.clone()));
    next.draft.clear();
    next.reply_target = None;

    // Sending commits any edit in progress
    let committed: Vec<Effect> = next
        .pending_edits
        .drain()
        .map(|(id, _)| Effect::cancel(TimerKey::EditDeadline(id)))
        .collect();

    let request_id = next.allocate_request();
    Ok(TransitionResult::new(next)
        .with_effects(committed)
        .with_effect(Effect::RequestReply {
            request_id,
            prompt: text,
        }))
}

fn timer_fired(state: &ConversationState, key: TimerKey) -> TransitionResult {
    match key {
        TimerKey::UndoOffer(id) => match state.pending_undo.get(&id) {
            Some(message) => {
                TransitionResult::new(state.clone()).with_effect(Effect::ConfirmUndo {
                    message_id: id,
                    text: message.text.clone(),
                })
            }
            None => TransitionResult::new(state.clone()),
        },

        TimerKey::UndoExpiry(id) => {
            if !state.pending_undo.contains_key(&id) {
                return TransitionResult::new(state.clone());
            }
            let mut next = state.clone();
            next.pending_undo.remove(&id);
            TransitionResult::new(next).with_effect(Effect::cancel(TimerKey::UndoOffer(id)))
        }

        TimerKey::EditDeadline(id) => {
            if !state.pending_edits.contains_key(&id) {
                return TransitionResult::new(state.clone());
            }
            let mut next = state.clone();
            if let Some(PendingEdit { index, message }) = next.pending_edits.remove(&id) {
                if next.draft.trim().is_empty() {
                    let index = index.min(next.messages.len());
                    next.messages.insert(index, message);
                }
            }
            TransitionResult::new(next)
        }
    }
}

/// Quote `text` for a reply draft: every line prefixed with `> `, then a blank line.
pub fn quote(text: &str) -> String {
    let mut quoted: String = text.lines().map(|line| format!("> {line}\n")).collect();
    if quoted.is_empty() {
        quoted.push_str(">\n");
    }
    quoted.push('\n');
    quoted
}
