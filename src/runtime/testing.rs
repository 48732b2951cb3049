//! Mock implementations for testing
//!
//! These mocks enable integration testing of the runtime without real I/O.

use super::traits::PlatformCapabilities;
use super::{start, ConversationHandle};
use crate::config::TimingConfig;
use crate::conversation::{ConversationState, MessageId};
use crate::inference::{InferenceClient, InferenceError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, watch};

// ============================================================================
// Mock Inference Client
// ============================================================================

/// Mock inference client that returns queued results in call order
pub struct MockInferenceClient {
    responses: Mutex<VecDeque<Result<String, InferenceError>>>,
    /// Record of all prompts sent
    pub prompts: Mutex<Vec<String>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn queue_error(&self, error: InferenceError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn generate_reply(&self, prompt: &str) -> Result<String, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::transport("No mock response queued")))
    }

    fn label(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Gated Inference Client (for completion-order testing)
// ============================================================================

type Gate = oneshot::Sender<Result<String, InferenceError>>;

/// Inference client whose calls block until the test releases them, in any order
#[derive(Default)]
pub struct GatedInferenceClient {
    calls: Mutex<Vec<(String, Option<Gate>)>>,
}

impl GatedInferenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Complete call number `index` (0-based, in arrival order)
    pub fn release(&self, index: usize, outcome: Result<String, InferenceError>) {
        let gate = self.calls.lock().unwrap()[index]
            .1
            .take()
            .expect("call already released");
        let _ = gate.send(outcome);
    }

    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        poll_until(timeout, || self.call_count() >= count).await
    }
}

#[async_trait]
impl InferenceClient for GatedInferenceClient {
    async fn generate_reply(&self, prompt: &str) -> Result<String, InferenceError> {
        let (tx, rx) = oneshot::channel();
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), Some(tx)));
        rx.await
            .unwrap_or_else(|_| Err(InferenceError::transport("Gate dropped")))
    }

    fn label(&self) -> &str {
        "gated"
    }
}

// ============================================================================
// Recording Platform
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Copy(String),
    Share(String),
    Speak(String),
    NotifySuccess,
    ConfirmUndo(MessageId, String),
}

/// Platform that records every capability request
#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<PlatformCall>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PlatformCapabilities for RecordingPlatform {
    fn copy_to_clipboard(&self, text: &str) {
        self.record(PlatformCall::Copy(text.to_string()));
    }

    fn present_share(&self, text: &str) {
        self.record(PlatformCall::Share(text.to_string()));
    }

    fn speak(&self, text: &str) {
        self.record(PlatformCall::Speak(text.to_string()));
    }

    fn notify_success(&self) {
        self.record(PlatformCall::NotifySuccess);
    }

    fn confirm_undo(&self, message_id: MessageId, text: &str) {
        self.record(PlatformCall::ConfirmUndo(message_id, text.to_string()));
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

async fn poll_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Builder for a runtime wired to mocks
pub struct TestRuntimeBuilder<C> {
    inference: Arc<C>,
    timing: TimingConfig,
}

impl TestRuntimeBuilder<MockInferenceClient> {
    pub fn new() -> Self {
        Self {
            inference: Arc::new(MockInferenceClient::new()),
            timing: TimingConfig::default(),
        }
    }
}

impl<C: InferenceClient + 'static> TestRuntimeBuilder<C> {
    pub fn inference<D: InferenceClient + 'static>(self, inference: D) -> TestRuntimeBuilder<D> {
        TestRuntimeBuilder {
            inference: Arc::new(inference),
            timing: self.timing,
        }
    }

    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn build(self) -> TestRuntime<C> {
        let platform = Arc::new(RecordingPlatform::new());
        let handle = start(self.timing, self.inference.clone(), platform.clone());
        let state_rx = handle.subscribe();
        TestRuntime {
            handle,
            inference: self.inference,
            platform,
            state_rx,
        }
    }
}

/// A running conversation plus access to its mocks
pub struct TestRuntime<C> {
    pub handle: ConversationHandle,
    pub inference: Arc<C>,
    pub platform: Arc<RecordingPlatform>,
    state_rx: watch::Receiver<ConversationState>,
}

impl<C> TestRuntime<C> {
    pub fn state(&self) -> ConversationState {
        self.state_rx.borrow().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.state().messages.into_iter().map(|m| m.text).collect()
    }

    /// Wait until a published state satisfies `check`
    pub async fn wait_for_state(
        &mut self,
        timeout: Duration,
        check: impl Fn(&ConversationState) -> bool,
    ) -> bool {
        let wait = async {
            loop {
                if check(&self.state_rx.borrow_and_update()) {
                    return true;
                }
                if self.state_rx.changed().await.is_err() {
                    return false;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }

    pub async fn wait_for_messages(&mut self, count: usize) -> bool {
        self.wait_for_state(Duration::from_secs(2), |s| s.messages.len() == count)
            .await
    }

    pub async fn wait_for_platform_call(&self, expected: &PlatformCall) -> bool {
        poll_until(Duration::from_secs(30), || {
            self.platform.calls().contains(expected)
        })
        .await
    }

    /// Push a marker through the event queue so everything sent before it is applied
    pub async fn flush(&mut self) {
        let marker = format!("flush-{}", MessageId::new());
        self.handle.set_draft(marker.clone()).await.unwrap();
        assert!(
            self.wait_for_state(Duration::from_secs(2), |s| s.draft == marker)
                .await
        );
        self.handle.set_draft("").await.unwrap();
        assert!(
            self.wait_for_state(Duration::from_secs(2), |s| s.draft.is_empty())
                .await
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Author, Message, FALLBACK_REPLY};

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            undo_offer_delay: Duration::from_millis(20),
            undo_window: Duration::from_secs(1),
            edit_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_mock_inference_client() {
        let mock = MockInferenceClient::new();
        mock.queue_reply("Hello");

        assert_eq!(mock.generate_reply("hi").await.unwrap(), "Hello");
        // Second call should fail (no more responses)
        assert!(mock.generate_reply("hi").await.is_err());
        assert_eq!(mock.recorded_prompts(), vec!["hi", "hi"]);
    }

    /// Integration test: submit then reply
    #[tokio::test]
    async fn test_submit_appends_user_then_assistant() {
        let mut rt = TestRuntimeBuilder::new().build();
        rt.inference.queue_reply("hi there");

        rt.handle.set_draft("hello").await.unwrap();
        rt.handle.submit("hello").await.unwrap();
        assert!(rt.wait_for_messages(2).await);

        let state = rt.state();
        assert_eq!(state.messages[0].author, Author::User);
        assert_eq!(state.messages[0].text, "hello");
        assert_eq!(state.messages[1].author, Author::Assistant);
        assert_eq!(state.messages[1].text, "hi there");
        assert!(state.draft.is_empty());
        assert!(!state.is_awaiting_reply());
        assert_eq!(rt.inference.recorded_prompts(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_user_message_visible_while_awaiting() {
        let mut rt = TestRuntimeBuilder::new()
            .inference(GatedInferenceClient::new())
            .build();

        rt.handle.submit("hello").await.unwrap();
        assert!(
            rt.wait_for_state(Duration::from_secs(2), |s| s.messages.len() == 1
                && s.is_awaiting_reply())
                .await
        );
        assert!(rt.inference.wait_for_calls(1, Duration::from_secs(2)).await);
        assert_eq!(rt.state().messages.len(), 1);

        rt.inference.release(0, Ok("hi there".to_string()));
        assert!(rt.wait_for_messages(2).await);
        assert!(!rt.state().is_awaiting_reply());
    }

    #[tokio::test]
    async fn test_transport_failure_appends_fallback() {
        let mut rt = TestRuntimeBuilder::new().build();
        rt.inference
            .queue_error(InferenceError::transport("Connection failed"));

        rt.handle.submit("hello").await.unwrap();
        assert!(rt.wait_for_messages(2).await);

        let state = rt.state();
        assert_eq!(state.messages[1].text, FALLBACK_REPLY);
        assert_eq!(state.messages[1].text, "no response received");
        assert_eq!(state.messages[1].author, Author::Assistant);
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let mut rt = TestRuntimeBuilder::new().build();
        rt.inference.queue_reply("ok");

        rt.handle.submit("   ").await.unwrap();
        rt.handle.submit("").await.unwrap();
        rt.flush().await;

        let state = rt.state();
        assert!(state.messages.is_empty());
        assert!(!state.is_awaiting_reply());
        assert!(rt.inference.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_submits_complete_in_completion_order() {
        let mut rt = TestRuntimeBuilder::new()
            .inference(GatedInferenceClient::new())
            .build();

        rt.handle.submit("one").await.unwrap();
        rt.handle.submit("two").await.unwrap();
        assert!(rt.inference.wait_for_calls(2, Duration::from_secs(2)).await);

        // Second request finishes first
        rt.inference.release(1, Ok("reply two".to_string()));
        assert!(rt.wait_for_messages(3).await);
        assert!(rt.state().is_awaiting_reply());

        rt.inference.release(0, Ok("reply one".to_string()));
        assert!(rt.wait_for_messages(4).await);
        assert!(!rt.state().is_awaiting_reply());

        assert_eq!(rt.texts(), vec!["one", "two", "reply two", "reply one"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_offers_undo_and_undo_restores_at_end() {
        let mut rt = TestRuntimeBuilder::new().timing(fast_timing()).build();
        rt.inference.queue_reply("hi");

        rt.handle.submit("hello").await.unwrap();
        assert!(rt.wait_for_messages(2).await);
        let deleted: Message = rt.state().messages[0].clone();

        rt.handle.delete(deleted.id).await.unwrap();
        assert!(rt.wait_for_messages(1).await);
        assert_eq!(rt.texts(), vec!["hi"]);

        assert!(
            rt.wait_for_platform_call(&PlatformCall::ConfirmUndo(deleted.id, "hello".to_string()))
                .await
        );

        rt.handle.undo(deleted.id).await.unwrap();
        assert!(rt.wait_for_messages(2).await);
        assert_eq!(rt.state().messages.last(), Some(&deleted));
        assert!(rt.wait_for_platform_call(&PlatformCall::NotifySuccess).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_after_window_is_ignored() {
        let mut rt = TestRuntimeBuilder::new().timing(fast_timing()).build();
        rt.inference.queue_reply("hi");

        rt.handle.submit("hello").await.unwrap();
        assert!(rt.wait_for_messages(2).await);
        let id = rt.state().messages[0].id;

        rt.handle.delete(id).await.unwrap();
        assert!(rt.wait_for_messages(1).await);
        assert!(
            rt.wait_for_state(Duration::from_secs(10), |s| s.pending_undo(id).is_none())
                .await
        );

        rt.handle.undo(id).await.unwrap();
        rt.flush().await;
        assert_eq!(rt.texts(), vec!["hi"]);
        assert!(!rt.platform.calls().contains(&PlatformCall::NotifySuccess));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleting_unknown_id_changes_nothing() {
        let mut rt = TestRuntimeBuilder::new().timing(fast_timing()).build();
        rt.inference.queue_reply("hi");
        rt.handle.submit("hello").await.unwrap();
        assert!(rt.wait_for_messages(2).await);

        rt.handle.delete(MessageId::new()).await.unwrap();
        rt.flush().await;
        assert_eq!(rt.texts(), vec!["hello", "hi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_edit_restores_original_position() {
        let mut rt = TestRuntimeBuilder::new()
            .inference(GatedInferenceClient::new())
            .timing(fast_timing())
            .build();

        for text in ["one", "two", "three"] {
            rt.handle.submit(text).await.unwrap();
        }
        assert!(rt.wait_for_messages(3).await);
        let original = rt.state().messages[1].clone();

        rt.handle.edit(original.id).await.unwrap();
        assert!(
            rt.wait_for_state(Duration::from_secs(2), |s| s.draft == "two")
                .await
        );
        assert_eq!(rt.texts(), vec!["one", "three"]);

        rt.handle.set_draft("").await.unwrap();
        assert!(
            rt.wait_for_state(Duration::from_secs(30), |s| s.messages.len() == 3)
                .await
        );
        assert_eq!(rt.texts(), vec!["one", "two", "three"]);
        assert_eq!(rt.state().messages[1], original);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submitted_edit_is_not_rolled_back() {
        let mut rt = TestRuntimeBuilder::new()
            .inference(GatedInferenceClient::new())
            .timing(fast_timing())
            .build();

        rt.handle.submit("teh cat").await.unwrap();
        assert!(rt.wait_for_messages(1).await);
        let id = rt.state().messages[0].id;

        rt.handle.edit(id).await.unwrap();
        rt.handle.submit("the cat").await.unwrap();
        assert!(
            rt.wait_for_state(Duration::from_secs(2), |s| s.messages.len() == 1
                && s.messages[0].text == "the cat")
                .await
        );

        tokio::time::sleep(Duration::from_secs(11)).await;
        rt.flush().await;
        assert_eq!(rt.texts(), vec!["the cat"]);
    }

    #[tokio::test]
    async fn test_reply_quotes_without_touching_messages() {
        let mut rt = TestRuntimeBuilder::new().build();
        rt.inference.queue_reply("I like tea");
        rt.handle.submit("what do you like?").await.unwrap();
        assert!(rt.wait_for_messages(2).await);
        let target = rt.state().messages[1].id;

        rt.handle.reply(target).await.unwrap();
        assert!(
            rt.wait_for_state(Duration::from_secs(2), |s| s.reply_target == Some(target))
                .await
        );
        let state = rt.state();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.draft, "> I like tea\n\n");
    }

    #[tokio::test]
    async fn test_passthroughs_reach_platform() {
        let mut rt = TestRuntimeBuilder::new().build();
        rt.inference.queue_reply("hi");
        rt.handle.submit("hello").await.unwrap();
        assert!(rt.wait_for_messages(2).await);
        let reply = rt.state().messages[1].id;

        rt.handle.copy(reply).await.unwrap();
        rt.handle.speak(reply).await.unwrap();
        rt.handle.share("hello").await.unwrap();
        rt.flush().await;

        assert_eq!(
            rt.platform.calls(),
            vec![
                PlatformCall::Copy("hi".to_string()),
                PlatformCall::NotifySuccess,
                PlatformCall::Speak("hi".to_string()),
                PlatformCall::Share("hello".to_string()),
            ]
        );
        assert_eq!(rt.texts(), vec!["hello", "hi"]);
    }

    #[tokio::test]
    async fn test_settled_reflects_every_queued_event() {
        let rt = TestRuntimeBuilder::new()
            .inference(GatedInferenceClient::new())
            .build();

        for text in ["one", "two", "three"] {
            rt.handle.submit(text).await.unwrap();
        }
        let first = rt.handle.settled().await.unwrap().messages[0].id;

        // Back-to-back deletes of "the first message" resolve against fresh state
        rt.handle.delete(first).await.unwrap();
        let second = rt.handle.settled().await.unwrap().messages[0].id;
        rt.handle.delete(second).await.unwrap();
        rt.handle.set_draft("typing").await.unwrap();

        let state = rt.handle.settled().await.unwrap();
        assert_eq!(
            state.messages.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(),
            vec!["three"]
        );
        assert_eq!(state.draft, "typing");
    }

    #[tokio::test]
    async fn test_runtime_stops_when_handles_are_dropped() {
        let rt = TestRuntimeBuilder::new().build();
        let mut state_rx = rt.handle.subscribe();
        drop(rt);

        let closed = tokio::time::timeout(Duration::from_secs(2), state_rx.changed()).await;
        assert!(matches!(closed, Ok(Err(_))));
    }
}
