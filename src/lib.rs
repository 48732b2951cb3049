//! Lonelyn't - a chat companion backed by a hosted text generation model
//!
//! The conversation is a pure state machine (`conversation`) driven by a
//! tokio runtime (`runtime`) that talks to an inference endpoint
//! (`inference`) and to whatever shell presents it (`platform`).

pub mod config;
pub mod console;
pub mod conversation;
pub mod inference;
pub mod platform;
pub mod runtime;
