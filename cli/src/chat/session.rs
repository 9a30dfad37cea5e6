//! # Chat Session
//!
//! File: cli/src/chat/session.rs
//!
//! ## Overview
//!
//! Runs one question through the whole flow, strictly in sequence:
//!
//! 1. Look up record context ([`ContextResolver`]).
//! 2. Build the prompt ([`PromptBuilder`]) and call the model once.
//! 3. On a non-empty answer, append the exchange ([`ConversationLog`]).
//!
//! Failure handling per turn:
//! - Lookup failure: logged, the turn continues without context.
//! - Model failure or empty answer: the turn ends with `ChatError::Model`;
//!   nothing is persisted.
//! - Persistence failure: the answer is still returned, with a warning.
//!
//! When the store could not be opened at startup the session runs without a
//! resolver and without a log: every turn is answered from general knowledge
//! and nothing is saved.
//!
use super::exchange::{Exchange, NewExchange};
use super::identity::Identity;
use super::log::ConversationLog;
use super::prompt::PromptBuilder;
use super::resolver::ContextResolver;
use crate::common::model::ModelClient;
use crate::common::store::DocumentStore;
use crate::core::config::Config;
use crate::core::error::{ChatError, Result};
use anyhow::anyhow;
use futures_util::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of one answered question.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Record context the answer was conditioned on, if any.
    pub context: Option<String>,
    pub answer: String,
    /// The stored exchange, when persistence succeeded.
    pub saved: Option<Exchange>,
    /// Why the exchange was not stored, when a log exists but the write failed.
    pub persistence_warning: Option<String>,
}

pub struct ChatSession {
    identity: Identity,
    model: Arc<dyn ModelClient>,
    resolver: Option<ContextResolver>,
    log: Option<ConversationLog>,
    prompts: PromptBuilder,
}

impl ChatSession {
    /// Wires the components. `store` is `None` when the store was unavailable
    /// at startup.
    pub fn new(
        identity: Identity,
        model: Arc<dyn ModelClient>,
        store: Option<Arc<dyn DocumentStore>>,
        config: &Config,
    ) -> Self {
        let resolver = store.as_ref().map(|s| {
            ContextResolver::new(
                Arc::clone(s),
                &config.store.records_collection,
                &config.retrieval,
            )
        });
        let log = store.map(|s| ConversationLog::new(s, &config.store.history_collection));
        Self {
            identity,
            model,
            resolver,
            log,
            prompts: PromptBuilder::default(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Whether lookups and history are available this session.
    pub fn has_store(&self) -> bool {
        self.log.is_some()
    }

    /// Answers `question`.
    ///
    /// # Errors
    ///
    /// `ChatError::EmptyQuestion` for blank input (the model is not called) and
    /// `ChatError::Model` when generation fails.
    #[instrument(skip(self), fields(user = %self.identity.username()))]
    pub async fn ask(&self, question: &str) -> std::result::Result<TurnOutcome, ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let context = match &self.resolver {
            Some(resolver) => resolver.resolve(question).await,
            None => None,
        };
        let prompt = self.prompts.build(question, context.as_deref());
        info!(
            "Asking model ({})",
            if context.is_some() { "record context" } else { "general knowledge" }
        );

        let answer = self
            .model
            .generate(&prompt.content, prompt.instruction.as_deref())
            .await?;

        let mut outcome = TurnOutcome {
            context,
            answer,
            saved: None,
            persistence_warning: None,
        };

        if let Some(log) = &self.log {
            let saved = match NewExchange::new(&self.identity, question, &outcome.answer) {
                Ok(entry) => log.append(entry).await,
                Err(e) => Err(anyhow!(e)),
            };
            match saved {
                Ok(exchange) => outcome.saved = Some(exchange),
                Err(e) => {
                    warn!("Exchange not saved: {:#}", e);
                    outcome.persistence_warning = Some(format!("{:#}", e));
                }
            }
        }

        Ok(outcome)
    }

    /// History visible to this identity, newest first, at most `limit` entries.
    ///
    /// # Errors
    ///
    /// `ChatError::Forbidden` when the identity may not read `owner`'s history,
    /// `ChatError::StoreUnavailable` when the session has no store.
    pub async fn history(&self, owner: Option<&str>, limit: Option<usize>) -> Result<Vec<Exchange>> {
        let scope = self.identity.history_scope(owner)?;
        let log = self.log.as_ref().ok_or_else(|| {
            anyhow!(ChatError::StoreUnavailable(
                "history is disabled for this session".into()
            ))
        })?;
        let entries = log.list(&scope);
        match limit {
            Some(n) => entries.take(n).try_collect().await,
            None => entries.try_collect().await,
        }
    }
}
