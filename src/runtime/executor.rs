//! Conversation runtime executor

use super::traits::PlatformCapabilities;
use super::Inbound;
use crate::config::TimingConfig;
use crate::conversation::{transition, ConversationState, Effect, Event, MessageId, TimerKey};
use crate::inference::InferenceClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// A running timer task and the generation it will report when it fires
struct TimerSlot {
    generation: u64,
    cancel: CancellationToken,
}

/// Give a completed reply a fresh id if its id is already taken, so the
/// request is still retired from the in-flight set
fn rekey_colliding_reply(state: &ConversationState, event: &mut Event) {
    if let Event::ReplyReceived {
        request_id,
        message_id,
        ..
    } = event
    {
        while state.contains_id(*message_id) {
            tracing::warn!(%request_id, %message_id, "Reply id already in use, assigning a new one");
            *message_id = MessageId::new();
        }
    }
}

/// Owns the conversation state; every mutation happens on this task
pub struct ConversationRuntime<C, P>
where
    C: InferenceClient + 'static,
    P: PlatformCapabilities + 'static,
{
    timing: TimingConfig,
    state: ConversationState,
    inference: Arc<C>,
    platform: Arc<P>,
    event_rx: mpsc::Receiver<Inbound>,
    /// Weak so the loop ends once every handle is gone
    event_tx: mpsc::WeakSender<Inbound>,
    state_tx: watch::Sender<ConversationState>,
    timers: HashMap<TimerKey, TimerSlot>,
    next_generation: u64,
}

impl<C, P> ConversationRuntime<C, P>
where
    C: InferenceClient + 'static,
    P: PlatformCapabilities + 'static,
{
    pub fn new(
        timing: TimingConfig,
        inference: C,
        platform: P,
        event_rx: mpsc::Receiver<Inbound>,
        event_tx: &mpsc::Sender<Inbound>,
        state_tx: watch::Sender<ConversationState>,
    ) -> Self {
        Self {
            timing,
            state: ConversationState::new(),
            inference: Arc::new(inference),
            platform: Arc::new(platform),
            event_rx,
            event_tx: event_tx.downgrade(),
            state_tx,
            timers: HashMap::new(),
            next_generation: 0,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(endpoint = %self.inference.label(), "Starting conversation runtime");

        while let Some(inbound) = self.event_rx.recv().await {
            match inbound {
                Inbound::Event(event) => self.process_event(event),
                // Everything queued before the barrier has been applied and published
                Inbound::Barrier(ack) => {
                    let _ = ack.send(());
                }
            }
        }

        for (_, slot) in self.timers.drain() {
            slot.cancel.cancel();
        }
        tracing::info!(
            messages = self.state.messages.len(),
            "Conversation runtime stopped"
        );
    }

    fn process_event(&mut self, mut event: Event) {
        rekey_colliding_reply(&self.state, &mut event);

        if let Event::TimerFired { key, generation } = &event {
            let current = self.timers.get(key).map(|slot| slot.generation);
            if current != Some(*generation) {
                tracing::debug!(?key, generation = *generation, "Dropping fire from a replaced timer");
                return;
            }
            self.timers.remove(key);
        }

        // Pure state transition
        let result = match transition(&self.state, &self.timing, event) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected conversation event");
                return;
            }
        };

        // Publish before running effects so the user message is visible
        // before its request is dispatched
        if result.new_state != self.state {
            self.state = result.new_state;
            self.state_tx.send_replace(self.state.clone());
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestReply { request_id, prompt } => {
                let Some(event_tx) = self.event_tx.upgrade() else {
                    tracing::debug!(%request_id, "Runtime shutting down, not sending request");
                    return;
                };
                let inference = self.inference.clone();

                tokio::spawn(async move {
                    tracing::debug!(%request_id, "Requesting reply (background)");
                    // Failures are logged by the client wrapper; the transition substitutes the fallback
                    let outcome = inference.generate_reply(&prompt).await;
                    let _ = event_tx
                        .send(Inbound::Event(Event::ReplyReceived {
                            request_id,
                            message_id: MessageId::new(),
                            outcome,
                        }))
                        .await;
                });
            }

            Effect::ScheduleTimer { key, delay } => self.schedule_timer(key, delay),

            Effect::CancelTimer { key } => {
                if let Some(slot) = self.timers.remove(&key) {
                    slot.cancel.cancel();
                }
            }

            Effect::CopyToClipboard { text } => self.platform.copy_to_clipboard(&text),

            Effect::PresentShare { text } => self.platform.present_share(&text),

            Effect::Speak { text } => self.platform.speak(&text),

            Effect::NotifySuccess => self.platform.notify_success(),

            Effect::ConfirmUndo { message_id, text } => {
                self.platform.confirm_undo(message_id, &text);
            }
        }
    }

    fn schedule_timer(&mut self, key: TimerKey, delay: Duration) {
        let Some(event_tx) = self.event_tx.upgrade() else {
            return;
        };

        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = CancellationToken::new();
        let replaced = self.timers.insert(
            key,
            TimerSlot {
                generation,
                cancel: cancel.clone(),
            },
        );
        if let Some(old) = replaced {
            old.cancel.cancel();
        }

        tokio::spawn(async move {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {}

                () = tokio::time::sleep(delay) => {
                    let _ = event_tx
                        .send(Inbound::Event(Event::TimerFired { key, generation }))
                        .await;
                }
            }
        });
    }
}
