//! # RagChat Ask Command
//!
//! File: cli/src/commands/ask.rs
//!
//! ## Overview
//!
//! Implements `ragchat ask`, a single chat turn from the command line. The
//! words after `ask` are joined with spaces into one question.
//!
//! ```bash
//! ragchat --user alice ask "What is Alice's grade?"
//! ragchat --user alice ask what is the weather today
//! ```
//!
//! Exits with status 1 when the model call fails; a failed history write is
//! only a warning.
//!
use super::{print_outcome, start_session, GlobalArgs};
use crate::core::error::Result;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Ask a single question and print the answer")]
pub struct AskArgs {
    /// The question. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
}

impl AskArgs {
    fn question(&self) -> String {
        self.question.join(" ")
    }
}

pub async fn handle_ask(global: &GlobalArgs, args: AskArgs) -> Result<()> {
    let question = args.question();
    info!("Handling ask command");
    let (session, _config) = start_session(global).await?;
    let outcome = session.ask(&question).await?;
    print_outcome(&outcome);
    Ok(())
}
