//! Text-generation client abstraction
//!
//! One outbound call: submit a prompt, get the generated reply back.

mod error;
mod huggingface;

pub use error::{InferenceError, InferenceErrorKind};
pub use huggingface::{parse_reply, HuggingFaceService};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for text-generation backends
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Generate a reply for `prompt`. Never retried by callers.
    async fn generate_reply(&self, prompt: &str) -> Result<String, InferenceError>;

    /// Endpoint or model label used in logs
    fn label(&self) -> &str;
}

#[async_trait]
impl<T: InferenceClient + ?Sized> InferenceClient for Arc<T> {
    async fn generate_reply(&self, prompt: &str) -> Result<String, InferenceError> {
        (**self).generate_reply(prompt).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

/// Logging wrapper for inference clients
pub struct LoggingService<C> {
    inner: C,
    label: String,
}

impl<C: InferenceClient> LoggingService<C> {
    pub fn new(inner: C) -> Self {
        let label = inner.label().to_string();
        Self { inner, label }
    }
}

#[async_trait]
impl<C: InferenceClient> InferenceClient for LoggingService<C> {
    async fn generate_reply(&self, prompt: &str) -> Result<String, InferenceError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate_reply(prompt).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.label,
                    duration_ms = %duration.as_millis(),
                    prompt_chars = prompt.chars().count(),
                    reply_chars = reply.chars().count(),
                    "Inference request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.label,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Inference request failed"
                );
            }
        }

        result
    }

    fn label(&self) -> &str {
        &self.label
    }
}
