//! # RagChat Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the RagChat CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to appropriate command handlers
//!
//! ## Architecture
//!
//! - Each top-level command (`ask`, `chat`, etc.) is a variant in the `Commands` enum
//! - Global arguments (config, store, identity, API key) are parsed once and
//!   passed to every handler
//! - All errors are propagated to this level for consistent handling
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! ragchat --help
//!
//! # One question, with info-level logs on stderr
//! ragchat -v --user alice ask "What is Alice's grade?"
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level
//! 3. Route to appropriate command handler
//! 4. Format and display any errors that occur
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod chat; // Domain components (resolver, prompt, log, session)
mod commands; // Command handlers (ask, chat, history, records)
mod common; // External collaborators (document store, model client)
mod core; // Core infrastructure (errors, config, templating)

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "ragchat",
    about = "💬 RagChat: Ask a hosted model questions, grounded in your own records",
    long_about = "Answers questions with a hosted language model. When a question mentions a\n\
                  known name, the matching record is looked up and the model is told to answer\n\
                  from it alone. Every answered exchange is saved to a local history.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    global: commands::GlobalArgs,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Parser, Debug)]
enum Commands {
    Ask(commands::ask::AskArgs),
    Chat(commands::chat::ChatArgs),
    #[command(alias = "h")]
    History(commands::history::HistoryArgs),
    /// Seed and inspect the records used as context.
    Records(commands::records::RecordsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let global = &cli.global;
    let command_result = match cli.command {
        Commands::Ask(args) => commands::ask::handle_ask(global, args).await,
        Commands::Chat(args) => commands::chat::handle_chat(global, args).await,
        Commands::History(args) => commands::history::handle_history(global, args).await,
        Commands::Records(args) => commands::records::handle_records(global, args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
