//! # RagChat Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the top-level commands of the RagChat CLI and the
//! pieces they share: the global arguments (configuration file, store path,
//! identity, API key) and the startup steps every command runs in some
//! combination.
//!
//! ## Commands
//!
//! - `ask`: Answer one question and exit
//! - `chat`: Interactive question/answer loop
//! - `history`: List stored exchanges within the caller's scope
//! - `records`: Seed and inspect the entity-record collection
//!
//! ## Startup
//!
//! 1. [`GlobalArgs::load_config`] resolves the layered configuration and
//!    applies the `--store` override.
//! 2. [`GlobalArgs::identity`] validates `--user`/`--role`. Commands that chat
//!    or read history call it before touching any service.
//! 3. The store is opened either as required ([`open_store`], used by
//!    `history` and `records`) or best-effort ([`open_store_for_session`],
//!    used by `ask` and `chat`, which keep working without it).
//!
use crate::chat::identity::{Identity, Role};
use crate::chat::session::{ChatSession, TurnOutcome};
use crate::common::model::{GeminiClient, ModelClient};
use crate::common::store::{DocumentStore, SqliteStore};
use crate::core::config::{self, Config};
use crate::core::error::{ChatError, Result};
use anyhow::anyhow;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answers a single question.
pub mod ask;
/// Interactive chat loop.
pub mod chat;
/// Lists stored exchanges.
pub mod history;
/// Manages the entity records used as context.
pub mod records;

/// Arguments accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file to use instead of the user/project files.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path of the SQLite database, overriding `store.path`.
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Username recorded as the owner of each exchange.
    #[arg(short, long, global = true, env = "RAGCHAT_USER")]
    pub user: Option<String>,

    /// Role of the user. Privileged users may read everyone's history.
    #[arg(long, global = true, value_enum, default_value_t = Role::Standard)]
    pub role: Role,

    /// API key for the hosted model.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl GlobalArgs {
    /// Effective configuration, with `--store` applied on top.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = config::load_config(self.config.as_deref())?;
        if let Some(path) = &self.store {
            config.store.path = path.to_string_lossy().into_owned();
        }
        Ok(config)
    }

    /// The asker. Fails when no username was given.
    pub fn identity(&self) -> Result<Identity> {
        Ok(Identity::new(self.user.as_deref().unwrap_or_default(), self.role)?)
    }

    /// The model client for this run. Fails early when no API key is set.
    pub fn model_client(&self, config: &Config) -> Result<Arc<dyn ModelClient>> {
        let client = GeminiClient::new(
            &config.model.base_url,
            &config.model.name,
            self.api_key.clone(),
        )
        .map_err(|e| anyhow!(ChatError::from(e)))?;
        Ok(Arc::new(client))
    }
}

/// Opens the configured store or fails with `ChatError::StoreUnavailable`.
pub async fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let store = SqliteStore::open(Path::new(&config.store.path)).await?;
    debug!("Using document store at {}", store.path().display());
    Ok(Arc::new(store))
}

/// Opens the configured store for a chat session. When that fails the error is
/// reported once and the session continues without lookup or history.
pub async fn open_store_for_session(config: &Config) -> Option<Arc<dyn DocumentStore>> {
    match open_store(config).await {
        Ok(store) => Some(store as Arc<dyn DocumentStore>),
        Err(e) => {
            warn!("{:#}", e);
            eprintln!(
                "Warning: {:#}. Record lookup and history are disabled for this session.",
                e
            );
            None
        }
    }
}

/// Builds a session from the global arguments: identity, model, then store.
pub async fn start_session(global: &GlobalArgs) -> Result<(ChatSession, Config)> {
    let identity = global.identity()?;
    let config = global.load_config()?;
    let model = global.model_client(&config)?;
    let store = open_store_for_session(&config).await;
    info!("Starting session for {}", identity);
    Ok((ChatSession::new(identity, model, store, &config), config))
}

/// Prints one answered turn: the retrieval notice, the answer, and any
/// persistence warning.
pub fn print_outcome(outcome: &TurnOutcome) {
    if outcome.context.is_some() {
        println!("🔍 Record found. Answering from record context.");
    } else {
        println!("No matching record. Answering from general knowledge.");
    }
    println!();
    println!("{}", outcome.answer.trim_end());
    if let Some(warning) = &outcome.persistence_warning {
        eprintln!("Warning: {}. The answer was not saved to history.", warning);
    }
}
