//! Interactive shell.
//!
//! rustyline blocks, so the editor lives on its own thread and hands each
//! line to the async loop, waiting for the command to finish before it
//! prompts again.
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::commands::{self, Flow};
use super::session::Session;
use crate::update::UpdateStatus;

const PROMPT: &str = "vip> ";

enum Input {
    Line(String),
    Closed,
}

pub async fn run(mut session: Session) -> Result<()> {
    session.start_background_tasks(true);

    if session.config().update.check_on_startup {
        spawn_update_check(&session);
    }

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let (ready_tx, ready_rx) = std_mpsc::channel();
    let reader = std::thread::spawn(move || read_lines(input_tx, ready_rx));

    while let Some(input) = input_rx.recv().await {
        let line = match input {
            Input::Line(line) => line,
            Input::Closed => break,
        };

        let flow = match commands::parse_command(&line) {
            Ok(Some(command)) => {
                debug!("Executing shell command: {:?}", command);
                match commands::execute(command, &mut session).await {
                    Ok(flow) => flow,
                    Err(e) => {
                        println!("❌ Error: {:#}", e);
                        Flow::Continue
                    }
                }
            }
            Ok(None) => Flow::Continue,
            Err(usage) => {
                println!("{}", usage);
                Flow::Continue
            }
        };

        if flow == Flow::Quit || ready_tx.send(()).is_err() {
            break;
        }
    }

    drop(ready_tx);
    println!("👋 Goodbye!");
    session.shutdown().await;
    let _ = tokio::task::spawn_blocking(move || reader.join()).await;
    Ok(())
}

fn read_lines(input: mpsc::UnboundedSender<Input>, ready: std_mpsc::Receiver<()>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            warn!("Failed to start line editor: {}", e);
            let _ = input.send(Input::Closed);
            return;
        }
    };

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                if input.send(Input::Line(line)).is_err() || ready.recv().is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                let _ = input.send(Input::Closed);
                break;
            }
            Err(e) => {
                warn!("Line editor error: {}", e);
                let _ = input.send(Input::Closed);
                break;
            }
        }
    }
}

fn spawn_update_check(session: &Session) {
    let updater = session.updater().clone();
    tokio::spawn(async move {
        match updater.check().await {
            Ok(UpdateStatus::Available(info)) => {
                let urgency = if info.force { " (required)" } else { "" };
                println!(
                    "\n⬆️  Version {} is available{}. Type 'update' to download it.",
                    info.latest, urgency
                );
            }
            Ok(UpdateStatus::UpToDate { current }) => debug!("Version {} is current", current),
            Err(e) => warn!("Update check failed: {}", e),
        }
    });
}
