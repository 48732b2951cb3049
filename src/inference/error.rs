//! Inference error types

use thiserror::Error;

/// Inference error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InferenceError {
    pub kind: InferenceErrorKind,
    pub message: String,
}

impl InferenceError {
    pub fn new(kind: InferenceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::Transport, message)
    }

    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::EmptyResponse, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::MalformedResponse, message)
    }
}

/// Why a reply could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceErrorKind {
    /// Connection, timeout or IO failure
    Transport,
    /// Response arrived without a body
    EmptyResponse,
    /// Body present but not a list of objects carrying `generated_text`
    MalformedResponse,
}

impl InferenceErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::EmptyResponse => "empty_response",
            Self::MalformedResponse => "malformed_response",
        }
    }
}
