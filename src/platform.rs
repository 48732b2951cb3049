//! Terminal implementation of the platform capabilities

use crate::conversation::MessageId;
use crate::runtime::PlatformCapabilities;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const WORD_DELAY: Duration = Duration::from_millis(180);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks the one utterance allowed to play at a time
#[derive(Default)]
pub struct SingleVoice {
    current: Mutex<Option<CancellationToken>>,
}

impl SingleVoice {
    /// Stop whatever is playing and hand out the token for a new utterance
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.current).replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    pub fn stop(&self) {
        if let Some(current) = lock(&self.current).take() {
            current.cancel();
        }
    }
}

/// Capabilities backed by stdout and the system clipboard
pub struct ConsolePlatform {
    voice: SingleVoice,
    undo_offer: Mutex<Option<MessageId>>,
    word_delay: Duration,
}

impl ConsolePlatform {
    pub fn new() -> Self {
        Self {
            voice: SingleVoice::default(),
            undo_offer: Mutex::new(None),
            word_delay: WORD_DELAY,
        }
    }

    /// The deletion most recently offered for undo, if any
    pub fn take_undo_offer(&self) -> Option<MessageId> {
        lock(&self.undo_offer).take()
    }

    pub fn stop_speaking(&self) {
        self.voice.stop();
    }
}

impl Default for ConsolePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformCapabilities for ConsolePlatform {
    fn copy_to_clipboard(&self, text: &str) {
        // A fresh handle per copy; clipboard handles are not Send on every platform
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match copied {
            Ok(()) => println!("(copied to clipboard)"),
            Err(e) => {
                tracing::warn!(error = %e, "Clipboard unavailable, printing instead");
                println!("(copy) {text}");
            }
        }
    }

    fn present_share(&self, text: &str) {
        println!("┌─ share ─────────────");
        for line in text.lines() {
            println!("│ {line}");
        }
        println!("└─────────────────────");
    }

    fn speak(&self, text: &str) {
        let token = self.voice.begin();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available for speech playback");
            return;
        };
        runtime.spawn(play(text.to_string(), token, self.word_delay));
    }

    fn notify_success(&self) {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }

    fn confirm_undo(&self, message_id: MessageId, text: &str) {
        *lock(&self.undo_offer) = Some(message_id);
        println!("Deleted \"{}\". Type /undo to restore it.", preview(text));
    }
}

/// Print `text` one word at a time until finished or cancelled
async fn play(text: String, token: CancellationToken, word_delay: Duration) {
    print!("🔊");
    for word in text.split_whitespace() {
        tokio::select! {
            biased;

            () = token.cancelled() => {
                println!(" …");
                return;
            }

            () = tokio::time::sleep(word_delay) => {
                print!(" {word}");
                let _ = std::io::stdout().flush();
            }
        }
    }
    println!();
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 40;
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > LIMIT || text.lines().count() > 1 {
        let cut: String = first_line.chars().take(LIMIT).collect();
        format!("{cut}…")
    } else {
        first_line.to_string()
    }
}
