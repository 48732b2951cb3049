//! Configuration read from the environment

use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/blenderbot-400M-distill";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_UNDO_OFFER_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(5);
const DEFAULT_EDIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the inference endpoint
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub endpoint: String,
    /// Static bearer credential
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Delays driving the undo prompt and abandoned-edit restore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Delay between a delete and the undo prompt
    pub undo_offer_delay: Duration,
    /// How long a deleted message can still be restored
    pub undo_window: Duration,
    /// How long an emptied draft may stay empty before an edit is rolled back
    pub edit_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            undo_offer_delay: DEFAULT_UNDO_OFFER_DELAY,
            undo_window: DEFAULT_UNDO_WINDOW,
            edit_timeout: DEFAULT_EDIT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    pub inference: InferenceConfig,
    pub timing: TimingConfig,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparseable numbers keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(default, Duration::from_millis)
        };

        let timeout = lookup("LONELYNT_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Self {
            inference: InferenceConfig {
                endpoint: lookup("LONELYNT_ENDPOINT")
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                token: lookup("HF_TOKEN").filter(|v| !v.trim().is_empty()),
                timeout,
            },
            timing: TimingConfig {
                undo_offer_delay: millis("LONELYNT_UNDO_OFFER_MS", DEFAULT_UNDO_OFFER_DELAY),
                undo_window: millis("LONELYNT_UNDO_WINDOW_MS", DEFAULT_UNDO_WINDOW),
                edit_timeout: millis("LONELYNT_EDIT_TIMEOUT_MS", DEFAULT_EDIT_TIMEOUT),
            },
            json_logs: lookup("LONELYNT_LOG_JSON").is_some(),
        }
    }
}
