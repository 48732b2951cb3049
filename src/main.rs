//! Lonelyn't console
//!
//! Reads commands from stdin and prints the conversation as it changes.

use lonelynt::config::ChatConfig;
use lonelynt::console::{self, Command};
use lonelynt::conversation::ConversationState;
use lonelynt::inference::{HuggingFaceService, LoggingService};
use lonelynt::platform::ConsolePlatform;
use lonelynt::runtime::{self, ConversationHandle, RuntimeClosed};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatConfig::from_env();

    // Logs go to stderr so they never interleave with the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lonelynt=info".into()),
        )
        .with(config.json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr)
        }))
        .with((!config.json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    tracing::info!(
        endpoint = %config.inference.endpoint,
        timeout_secs = config.inference.timeout.as_secs(),
        "Loaded configuration"
    );

    let inference = LoggingService::new(HuggingFaceService::new(&config.inference)?);
    let platform = Arc::new(ConsolePlatform::new());
    let handle = runtime::start(config.timing, inference, platform.clone());

    let render = tokio::spawn(render_loop(handle.subscribe()));
    println!("{}", console::HELP);

    let result = input_loop(&handle, &platform).await;

    platform.stop_speaking();
    render.abort();
    tracing::info!("Goodbye");
    result
}

/// Print the transcript, then keep it current as states are published
async fn render_loop(mut state_rx: watch::Receiver<ConversationState>) {
    let mut previous = state_rx.borrow_and_update().clone();
    println!("{}", console::render_transcript(&previous.messages));

    while state_rx.changed().await.is_ok() {
        let current = state_rx.borrow_and_update().clone();
        let plan = console::plan_render(&previous, &current);

        if plan.full {
            println!("──────────");
            println!("{}", console::render_transcript(&current.messages));
        } else {
            for index in plan.appended {
                println!("{}", console::render_message(index, &current.messages[index]));
            }
        }
        if plan.typing_started {
            println!("{}", console::TYPING_INDICATOR);
        }
        if plan.draft_changed && !current.draft.is_empty() {
            println!("Draft (press enter to send, or type to continue):");
            println!("{}", current.draft);
        }

        previous = current;
    }
}

async fn input_loop(
    handle: &ConversationHandle,
    platform: &ConsolePlatform,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match console::parse_command(&line) {
            Command::Quit => break,
            Command::Help => println!("{}", console::HELP),
            Command::Invalid(reason) => println!("{reason}"),
            Command::Undo => match platform.take_undo_offer() {
                Some(message_id) => handle.undo(message_id).await?,
                None => println!("Nothing to undo"),
            },
            Command::StopSpeaking => platform.stop_speaking(),
            command => dispatch(handle, command).await?,
        }
    }

    Ok(())
}

/// Forward a conversation command to the runtime
async fn dispatch(handle: &ConversationHandle, command: Command) -> Result<(), RuntimeClosed> {
    // Resolve message numbers only after earlier commands have been applied
    let state = handle.settled().await?;
    let target = |index: usize| {
        let id = console::message_at(&state, index);
        if id.is_none() {
            println!("No message {}", index + 1);
        }
        id
    };

    match command {
        Command::Send(line) => handle.submit(console::compose(&state, &line)).await,
        Command::SendDraft => handle.submit_draft().await,
        Command::ClearDraft => handle.set_draft(String::new()).await,
        Command::Delete(index) => match target(index) {
            Some(id) => handle.delete(id).await,
            None => Ok(()),
        },
        Command::Edit(index) => match target(index) {
            Some(id) => handle.edit(id).await,
            None => Ok(()),
        },
        Command::Reply(index) => match target(index) {
            Some(id) => handle.reply(id).await,
            None => Ok(()),
        },
        Command::Copy(index) => match target(index) {
            Some(id) => handle.copy(id).await,
            None => Ok(()),
        },
        Command::Speak(index) => match target(index) {
            Some(id) => handle.speak(id).await,
            None => Ok(()),
        },
        Command::Share(index) => match state.messages.get(index) {
            Some(message) => handle.share(message.text.clone()).await,
            None => {
                println!("No message {}", index + 1);
                Ok(())
            }
        },
        Command::Undo | Command::StopSpeaking | Command::Help | Command::Quit | Command::Invalid(_) => Ok(()),
    }
}
