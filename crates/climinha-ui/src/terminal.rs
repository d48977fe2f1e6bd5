//! Terminal front-end: line commands in, redrawn panel out.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::models::AppState;
use crate::services::Command;
use crate::view;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Map one input line to a command. Unknown input is ignored.
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "" | "b" | "buscar" => Some(Command::FetchWeather),
        "q" | "sair" | "quit" => Some(Command::Quit),
        _ => None,
    }
}

/// Read commands from stdin until EOF, which counts as quit.
pub fn spawn_stdin_commands() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(command) => {
                        if tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    None => tracing::debug!("Ignoring input: {:?}", line),
                },
                Ok(None) => {
                    let _ = tx.send(Command::Quit).await;
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    let _ = tx.send(Command::Quit).await;
                    break;
                }
            }
        }
    });

    rx
}

/// Redraw the panel on stdout.
pub fn draw(state: &AppState) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(
        out,
        "{}{}\n\nEnter = buscar clima, q = sair",
        CLEAR_SCREEN,
        view::render(state)
    );
    let _ = out.flush();
}
