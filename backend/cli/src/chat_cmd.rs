//! CLI Chat Command
//!
//! Recognizes an image, then answers questions about it line by line from stdin.
//! `/engine <id>` switches engine, `/reset` starts a fresh conversation and
//! `/quit` leaves.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use scanchat_agent::Workbench;
use scanchat_core::EngineId;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::ocr_cmd::{load_with_progress, print_job};
use crate::terminal_output::{note_error, note_info, paint, stream_write, BOLD, CYAN};

enum Input<'a> {
    Quit,
    Reset,
    Engine(&'a str),
    Ask(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line.split_once(' ').unwrap_or((line, "")) {
        ("/quit" | "/exit", _) => Input::Quit,
        ("/reset", _) => Input::Reset,
        ("/engine", id) => Input::Engine(id.trim()),
        _ => Input::Ask(line),
    }
}

pub async fn run(workbench: Workbench, image: PathBuf) -> Result<()> {
    let workbench = Arc::new(workbench);
    if let Some(job) = load_with_progress(&workbench, image).await? {
        print_job(&job);
    }
    note_info("Ask about the image. /engine <id>, /reset, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    loop {
        stream_write(&mut stdout, &format!("{} ", paint(CYAN, &paint(BOLD, "you>"))))?;
        let Some(line) = lines.next_line().await? else { break };

        match parse_input(&line) {
            Input::Quit => break,
            Input::Reset => {
                workbench.reset_chat().await;
                note_info("Conversation cleared");
            }
            Input::Engine(id) => match id.parse::<EngineId>() {
                Ok(engine) => match workbench.select_engine(engine).await {
                    Ok(Some(job)) => {
                        print_job(&job);
                    }
                    Ok(None) => note_info(&format!("Engine set to {engine}")),
                    Err(e) => note_error(&e.to_string()),
                },
                Err(e) => note_error(&e),
            },
            Input::Ask(text) if text.is_empty() => {}
            Input::Ask(text) => match workbench.ask(text).await {
                Ok(turn) => println!("{} {}", paint(BOLD, "assistant>"), turn.content),
                Err(e) => note_error(&e.to_string()),
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert!(matches!(parse_input("/quit"), Input::Quit));
        assert!(matches!(parse_input("  /reset "), Input::Reset));
        assert!(matches!(parse_input("/engine gemini"), Input::Engine("gemini")));
        assert!(matches!(parse_input("what is the total?"), Input::Ask("what is the total?")));
    }
}
