//! Substitute collaborators for unit tests.

use crate::common::model::ModelClient;
use crate::common::store::{Document, DocumentStore, DocumentStream, Filter};
use crate::core::error::{ModelError, Result};
use anyhow::anyhow;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::Mutex;

/// A store whose every operation fails, as if the connection dropped.
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find_one(&self, _collection: &str, _filter: &Filter) -> Result<Option<Document>> {
        Err(anyhow!("connection reset"))
    }

    async fn insert_one(&self, _collection: &str, _document: Document) -> Result<()> {
        Err(anyhow!("connection reset"))
    }

    fn find<'a>(
        &'a self,
        _collection: &'a str,
        _filter: Filter,
        _sort_field: &'a str,
    ) -> DocumentStream<'a> {
        stream::once(async { Err(anyhow!("connection reset")) }).boxed()
    }
}

/// A model that replays a fixed answer (or failure) and records its calls.
pub struct ScriptedModel {
    reply: Option<String>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedModel {
    pub fn answering(answer: &str) -> Self {
        Self {
            reply: Some(answer.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with `ModelError::Api`.
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(content, instruction)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(
        &self,
        content: &str,
        instruction: Option<&str>,
    ) -> std::result::Result<String, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((content.to_string(), instruction.map(str::to_string)));
        match &self.reply {
            Some(answer) if answer.trim().is_empty() => Err(ModelError::EmptyResponse),
            Some(answer) => Ok(answer.clone()),
            None => Err(ModelError::Api {
                status: 503,
                body: "unavailable".into(),
            }),
        }
    }
}
