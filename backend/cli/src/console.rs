//! `argot console`: a line-based chat surface over stdin.
//!
//! Every line is handled on its own task so a handler parked on
//! `next_message` can receive the lines that follow it.

use std::sync::Arc;

use anyhow::{Context, Result};
use argot_commands::{CommandDispatcher, CommandResponse, DispatchError, Invocation, MessageOutcome};
use argot_core::{EntityId, PermissionLevel};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::terminal_output::{note_error, note_private, note_reply, note_warn, DIM, RESET};

/// Lines starting with this are console controls, never chat.
const CONTROL_PREFIX: char = '/';

pub async fn run(dispatcher: Arc<CommandDispatcher>, mut speaker: Invocation) -> Result<()> {
    let prefix = dispatcher.settings().prefix.clone();
    println!(
        "{DIM}Speaking as {} ({}). `{prefix}help` lists commands, `/as ID [LEVEL]` switches speaker, `/quit` exits.{RESET}",
        speaker.author, speaker.permission
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(control) = line.strip_prefix(CONTROL_PREFIX) {
            match apply_control(control, &mut speaker) {
                Control::Quit => break,
                Control::Switched => info!(author = %speaker.author, level = %speaker.permission, "speaker switched"),
                Control::Invalid(message) => note_error(&message),
            }
            continue;
        }

        let dispatcher = dispatcher.clone();
        let speaker = speaker.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.handle_message(&speaker, &line).await;
            render(outcome);
        });
    }

    debug!("console input closed");
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Control {
    Quit,
    Switched,
    Invalid(String),
}

fn apply_control(control: &str, speaker: &mut Invocation) -> Control {
    let mut words = control.split_whitespace();
    match words.next() {
        Some("quit" | "exit") => Control::Quit,
        Some("as") => {
            let Some(id) = words.next().and_then(|w| w.parse::<u64>().ok()) else {
                return Control::Invalid("usage: /as ID [LEVEL]".to_string());
            };
            if let Some(level) = words.next() {
                match level.parse::<PermissionLevel>() {
                    Ok(level) => speaker.permission = level,
                    Err(message) => return Control::Invalid(message),
                }
            }
            speaker.author = EntityId(id);
            Control::Switched
        }
        _ => Control::Invalid(format!("unknown control `/{control}`")),
    }
}

fn render(outcome: MessageOutcome) {
    match outcome {
        MessageOutcome::Dispatched(Ok(CommandResponse { text, ephemeral: false })) => note_reply(&text),
        MessageOutcome::Dispatched(Ok(CommandResponse { text, ephemeral: true })) => note_private(&text),
        MessageOutcome::Dispatched(Err(err @ DispatchError::Handler(_))) => {
            note_error(&format!("{err:#}"));
            note_warn(&err.user_message());
        }
        MessageOutcome::Dispatched(Err(err)) => note_warn(&err.user_message()),
        MessageOutcome::Replied | MessageOutcome::Ignored => {}
    }
}
