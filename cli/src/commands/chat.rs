//! # RagChat Interactive Chat
//!
//! File: cli/src/commands/chat.rs
//!
//! ## Overview
//!
//! Implements `ragchat chat`, a line-oriented loop over stdin. Each line is
//! one question, answered in sequence and stored as typed. Failures are reported for the turn and
//! the loop continues.
//!
//! Commands inside the loop:
//! - `/history`: The caller's visible history (see `ragchat history`).
//! - `/quit`, `/exit` or `bye`: Leave the loop. End of input does the same.
//!
//! ```bash
//! ragchat --user alice chat
//! ```
//!
use super::history::print_exchanges;
use super::{print_outcome, start_session, GlobalArgs};
use crate::chat::session::ChatSession;
use crate::core::error::Result;
use crate::core::templating::HistoryRenderer;
use anyhow::Context;
use clap::Parser;
use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{debug, error};

/// Entries shown by `/history`.
const HISTORY_PREVIEW: usize = 10;

#[derive(Parser, Debug)]
#[command(about = "Start an interactive chat session")]
pub struct ChatArgs {}

/// What a line of input asks the loop to do.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Quit,
    History,
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Skip
    } else if trimmed.eq_ignore_ascii_case("bye")
        || trimmed.eq_ignore_ascii_case("/quit")
        || trimmed.eq_ignore_ascii_case("/exit")
    {
        Input::Quit
    } else if trimmed.eq_ignore_ascii_case("/history") {
        Input::History
    } else {
        Input::Question(line)
    }
}

pub async fn handle_chat(global: &GlobalArgs, _args: ChatArgs) -> Result<()> {
    let (session, config) = start_session(global).await?;
    let renderer = HistoryRenderer::new(&config.display.history_template)?;

    println!("Logged in as {}.", session.identity());
    if session.has_store() {
        println!(
            "Record lookup enabled for '{}'. History is saved to '{}'.",
            config.store.records_collection, config.store.history_collection
        );
    } else {
        println!("Running without the document store. Answers use general knowledge only.");
    }
    println!("Type /history to see past exchanges, /quit to leave.");

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let line = match lines.next_line().await.context("Failed to read input")? {
            Some(line) => line,
            None => break,
        };

        match classify(&line) {
            Input::Skip => continue,
            Input::Quit => break,
            Input::History => show_history(&session, &renderer).await,
            Input::Question(question) => match session.ask(question).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => {
                    error!("Turn failed: {}", e);
                    eprintln!("Error: {}", e);
                }
            },
        }
    }

    debug!("Chat loop finished");
    println!("Goodbye.");
    Ok(())
}

async fn show_history(session: &ChatSession, renderer: &HistoryRenderer) {
    let shown = match session.history(None, Some(HISTORY_PREVIEW)).await {
        Ok(exchanges) => print_exchanges(renderer, &exchanges),
        Err(e) => Err(e),
    };
    if let Err(e) = shown {
        eprintln!("Error: {:#}", e);
    }
}
