//! Conversation state machine
//!
//! Elm-style: `transition` is pure and returns the effects the runtime must
//! carry out (network calls, timers, platform services).

mod effect;
pub mod event;
mod message;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, TimerKey};
pub use event::Event;
pub use message::{Author, Message, MessageId, RequestId};
pub use state::ConversationState;
pub use transition::{quote, transition, TransitionError, TransitionResult, FALLBACK_REPLY};
