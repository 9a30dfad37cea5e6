//! # Context Resolver
//!
//! File: cli/src/chat/resolver.rs
//!
//! ## Overview
//!
//! Decides whether a question is about one of a fixed, ordered list of known
//! entities and, if so, fetches that entity's record to use as prompt context.
//!
//! ## Matching
//!
//! - The query is lower-cased and each recognized name (lower-cased) is tested
//!   as a substring, in configured order.
//! - The first name found wins; later names are not considered, even if they
//!   also appear ("Compare Alice and Bob" resolves to Alice with the default
//!   list).
//! - The matched name, as configured, is looked up by exact equality on the
//!   name field of the records collection.
//!
//! ## Output
//!
//! The record minus its store identifier, rendered as
//! `"<label>: field: value, field: value"`. String values are written bare,
//! everything else as JSON.
//!
//! A lookup error never leaves this module: it is logged and treated exactly
//! like "no matching record".
//!
use crate::common::store::{Document, DocumentStore, Filter, ID_FIELD};
use crate::core::config::RetrievalConfig;
use crate::core::error::{ChatError, Result};
use anyhow::anyhow;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct ContextResolver {
    store: Arc<dyn DocumentStore>,
    collection: String,
    names: Vec<String>,
    label: String,
    name_field: String,
}

impl ContextResolver {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str, retrieval: &RetrievalConfig) -> Self {
        Self {
            store,
            collection: collection.to_string(),
            names: retrieval.names.clone(),
            label: retrieval.label.clone(),
            name_field: retrieval.name_field.clone(),
        }
    }

    /// First recognized name contained in `query`, ignoring case.
    pub fn match_name(&self, query: &str) -> Option<&str> {
        let query = query.to_lowercase();
        self.names
            .iter()
            .find(|name| query.contains(&name.to_lowercase()))
            .map(String::as_str)
    }

    /// Returns the context string for `query`, or `None` when no name matches,
    /// the record is missing, or the lookup fails.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> Option<String> {
        let name = self.match_name(query)?;
        debug!("Query mentions '{}'", name);
        match self.lookup(name).await {
            Ok(context) => context,
            Err(e) => {
                warn!("{:#}. Answering without record context.", e);
                None
            }
        }
    }

    /// Looks up the record whose name field equals `name` exactly and renders
    /// it. Errors are returned, not swallowed.
    pub async fn lookup(&self, name: &str) -> Result<Option<String>> {
        let filter = Filter::new().eq(self.name_field.as_str(), name);
        let record = self
            .store
            .find_one(&self.collection, &filter)
            .await
            .map_err(|e| {
                anyhow!(ChatError::LookupFailure(format!(
                    "'{}' in '{}': {:#}",
                    name, self.collection, e
                )))
            })?;
        Ok(record.map(|doc| self.render(doc)))
    }

    fn render(&self, mut record: Document) -> String {
        record.shift_remove(ID_FIELD);
        format!("{}: {}", self.label, render_fields(&record))
    }
}

fn render_fields(record: &Document) -> String {
    record
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}: {}", key, s),
            other => format!("{}: {}", key, other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
