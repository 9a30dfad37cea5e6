//! # RagChat History Command
//!
//! File: cli/src/commands/history.rs
//!
//! ## Overview
//!
//! Implements `ragchat history`, which prints stored exchanges newest first.
//!
//! What the caller may see is decided by their role before the store is
//! opened:
//! - A standard user sees their own exchanges. Asking for another owner fails.
//! - A privileged user sees everyone's exchanges, or one owner's with `--owner`.
//!
//! Each entry is rendered with the `display.history_template` Tera template.
//!
//! ```bash
//! ragchat --user alice history --limit 5
//! ragchat --user root --role privileged history --owner bob
//! ```
//!
use super::{open_store, GlobalArgs};
use crate::chat::exchange::Exchange;
use crate::chat::log::ConversationLog;
use crate::core::error::Result;
use crate::core::templating::HistoryRenderer;
use clap::Parser;
use futures_util::{StreamExt, TryStreamExt};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "List past exchanges, newest first")]
pub struct HistoryArgs {
    /// Only show exchanges of this owner. Other owners require the privileged role.
    #[arg(long)]
    owner: Option<String>,

    /// Show at most this many exchanges.
    #[arg(short = 'n', long)]
    limit: Option<usize>,
}

pub async fn handle_history(global: &GlobalArgs, args: HistoryArgs) -> Result<()> {
    let identity = global.identity()?;
    let scope = identity.history_scope(args.owner.as_deref())?;
    info!("Listing history for {} in scope {:?}", identity, scope);

    let config = global.load_config()?;
    let renderer = HistoryRenderer::new(&config.display.history_template)?;
    let store = open_store(&config).await?;
    let log = ConversationLog::new(store, &config.store.history_collection);

    let exchanges: Vec<Exchange> = log
        .list(&scope)
        .take(args.limit.unwrap_or(usize::MAX))
        .try_collect()
        .await?;
    print_exchanges(&renderer, &exchanges)
}

/// Renders `exchanges` to stdout, or a placeholder line when there are none.
pub fn print_exchanges(renderer: &HistoryRenderer, exchanges: &[Exchange]) -> Result<()> {
    if exchanges.is_empty() {
        println!("No exchanges yet.");
        return Ok(());
    }
    for exchange in exchanges {
        println!("{}", renderer.render(exchange)?.trim_end());
    }
    Ok(())
}
