//! Line-oriented console front-end
//!
//! Parsing and rendering are kept pure here; `main` owns the stdin loop and
//! the render task.

use crate::conversation::{Author, ConversationState, Message, MessageId};
use std::fmt::Write;

pub const PLACEHOLDER: &str = "Start a conversation";
pub const TYPING_INDICATOR: &str = "AI is typing…";

pub const HELP: &str = "\
Type a message and press enter to send it.
  <enter>      send the current draft
  /delete N    delete message N
  /undo        restore the last deleted message
  /edit N      move message N into the draft
  /reply N     quote message N into the draft
  /copy N      copy message N to the clipboard
  /share N     share message N
  /speak N     read message N aloud
  /stop        stop speaking
  /clear       clear the draft
  /quit        exit";

/// One line of user input, decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send
    Send(String),
    /// Empty line: send whatever is in the draft
    SendDraft,
    Delete(usize),
    Undo,
    Edit(usize),
    Reply(usize),
    Copy(usize),
    Share(usize),
    Speak(usize),
    StopSpeaking,
    ClearDraft,
    Help,
    Quit,
    Invalid(String),
}

/// Decode a line of input. Message numbers are 1-based as displayed.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix('/') else {
        if line.trim().is_empty() {
            return Command::SendDraft;
        }
        return Command::Send(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    if parts.next().is_some() {
        return Command::Invalid(format!("/{name} takes at most one argument"));
    }

    let indexed = |make: fn(usize) -> Command| match arg.map(str::parse::<usize>) {
        Some(Ok(n)) if n > 0 => make(n - 1),
        Some(_) => Command::Invalid(format!("/{name} needs a message number starting at 1")),
        None => Command::Invalid(format!("/{name} needs a message number")),
    };

    match name {
        "delete" | "d" => indexed(Command::Delete),
        "edit" | "e" => indexed(Command::Edit),
        "reply" | "r" => indexed(Command::Reply),
        "copy" | "c" => indexed(Command::Copy),
        "share" => indexed(Command::Share),
        "speak" | "say" => indexed(Command::Speak),
        "undo" | "u" => Command::Undo,
        "stop" => Command::StopSpeaking,
        "clear" => Command::ClearDraft,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Invalid(format!("Unknown command /{other}, try /help")),
    }
}

/// Look up the message shown at `index`
pub fn message_at(state: &ConversationState, index: usize) -> Option<MessageId> {
    state.messages.get(index).map(|m| m.id)
}

fn label(author: Author) -> &'static str {
    match author {
        Author::User => "You",
        Author::Assistant => "AI",
    }
}

/// Format one message with its 1-based number. Continuation lines are indented.
pub fn render_message(index: usize, message: &Message) -> String {
    let prefix = format!("[{}] {}: ", index + 1, label(message.author));
    let indent = " ".repeat(prefix.chars().count());
    let mut out = String::new();
    for (i, line) in message.text.lines().enumerate() {
        if i == 0 {
            let _ = write!(out, "{prefix}{line}");
        } else {
            let _ = write!(out, "\n{indent}{line}");
        }
    }
    if out.is_empty() {
        out = prefix.trim_end().to_string();
    }
    out
}

/// The whole transcript, or the placeholder when there is nothing yet
pub fn render_transcript(messages: &[Message]) -> String {
    if messages.is_empty() {
        return PLACEHOLDER.to_string();
    }
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| render_message(i, m))
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the render task should print after a state change
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderPlan {
    /// Reprint everything instead of appending
    pub full: bool,
    /// Indices of messages to print when appending
    pub appended: Vec<usize>,
    pub typing_started: bool,
    pub draft_changed: bool,
}

/// Compare two published states. Appends are printed incrementally; any other
/// change to the list (delete, edit, undo) reprints the transcript.
pub fn plan_render(previous: &ConversationState, current: &ConversationState) -> RenderPlan {
    let old = &previous.messages;
    let new = &current.messages;
    let is_append = new.len() >= old.len() && old.iter().zip(new).all(|(a, b)| a.id == b.id);

    RenderPlan {
        full: !is_append,
        appended: if is_append {
            (old.len()..new.len()).collect()
        } else {
            Vec::new()
        },
        typing_started: current.is_awaiting_reply() && !previous.is_awaiting_reply(),
        draft_changed: current.draft != previous.draft,
    }
}

/// Text to send for a plain input line. A quoted reply in the draft is
/// kept in front of the line; any other draft is replaced by it.
pub fn compose(state: &ConversationState, line: &str) -> String {
    if state.reply_target.is_some() && !state.draft.is_empty() {
        format!("{}{line}", state.draft)
    } else {
        line.to_string()
    }
}
