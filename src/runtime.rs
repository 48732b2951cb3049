//! Runtime for executing a conversation
//!
//! One tokio task owns the `ConversationState`. User actions, inference
//! completions and timer fires all arrive as events on a single channel, so
//! state mutations are serialized. UIs talk to the task through a
//! `ConversationHandle`.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

use executor::ConversationRuntime;
pub use traits::*;

use crate::config::TimingConfig;
use crate::conversation::{ConversationState, Event, MessageId};
use crate::inference::InferenceClient;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The runtime task has stopped and can no longer accept events
#[derive(Debug, Error)]
#[error("Conversation runtime is no longer running")]
pub struct RuntimeClosed;

/// What travels on the runtime's queue
pub(crate) enum Inbound {
    Event(Event),
    /// Acknowledged once every earlier message has been processed
    Barrier(oneshot::Sender<()>),
}

/// Start a conversation runtime on the current tokio runtime
pub fn start<C, P>(timing: TimingConfig, inference: C, platform: P) -> ConversationHandle
where
    C: InferenceClient + 'static,
    P: PlatformCapabilities + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (state_tx, state_rx) = watch::channel(ConversationState::new());

    let runtime = ConversationRuntime::new(timing, inference, platform, event_rx, &event_tx, state_tx);
    tokio::spawn(runtime.run());

    ConversationHandle { event_tx, state_rx }
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    event_tx: mpsc::Sender<Inbound>,
    state_rx: watch::Receiver<ConversationState>,
}

impl ConversationHandle {
    async fn send(&self, event: Event) -> Result<(), RuntimeClosed> {
        self.event_tx
            .send(Inbound::Event(event))
            .await
            .map_err(|_| RuntimeClosed)
    }

    /// Send `text` as a user message. Blank text is ignored.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), RuntimeClosed> {
        self.send(Event::Submit {
            text: text.into(),
            message_id: MessageId::new(),
        })
        .await
    }

    /// Send the current draft
    pub async fn submit_draft(&self) -> Result<(), RuntimeClosed> {
        self.send(Event::SubmitDraft {
            message_id: MessageId::new(),
        })
        .await
    }

    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), RuntimeClosed> {
        self.send(Event::SetDraft { text: text.into() }).await
    }

    pub async fn delete(&self, message_id: MessageId) -> Result<(), RuntimeClosed> {
        self.send(Event::Delete { message_id }).await
    }

    pub async fn undo(&self, message_id: MessageId) -> Result<(), RuntimeClosed> {
        self.send(Event::Undo { message_id }).await
    }

    pub async fn edit(&self, message_id: MessageId) -> Result<(), RuntimeClosed> {
        self.send(Event::Edit { message_id }).await
    }

    pub async fn reply(&self, message_id: MessageId) -> Result<(), RuntimeClosed> {
        self.send(Event::Reply { message_id }).await
    }

    pub async fn copy(&self, message_id: MessageId) -> Result<(), RuntimeClosed> {
        self.send(Event::Copy { message_id }).await
    }

    pub async fn share(&self, text: impl Into<String>) -> Result<(), RuntimeClosed> {
        self.send(Event::Share { text: text.into() }).await
    }

    pub async fn speak(&self, message_id: MessageId) -> Result<(), RuntimeClosed> {
        self.send(Event::Speak { message_id }).await
    }

    /// Receiver that observes every published state
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state_rx.clone()
    }

    /// Latest published state
    pub fn snapshot(&self) -> ConversationState {
        self.state_rx.borrow().clone()
    }

    /// State after every event sent so far through this or any other handle
    /// has been applied. Replies and timers still in progress may land later.
    pub async fn settled(&self) -> Result<ConversationState, RuntimeClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.event_tx
            .send(Inbound::Barrier(ack_tx))
            .await
            .map_err(|_| RuntimeClosed)?;
        ack_rx.await.map_err(|_| RuntimeClosed)?;
        Ok(self.snapshot())
    }
}
