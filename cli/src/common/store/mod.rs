//! # RagChat Document Store Interface
//!
//! File: cli/src/common/store/mod.rs
//!
//! ## Overview
//!
//! This module defines the narrow document-store interface the chat components
//! depend on, together with the backends that implement it. Documents are JSON
//! objects grouped into named collections. Two collections are used: the
//! entity records (read-only from the chat's point of view) and the exchange
//! history (append and scan).
//!
//! ## Architecture
//!
//! - **`DocumentStore`**: The trait. `find_one`, `insert_one` and `find` (a
//!   filtered scan sorted descending by one field).
//! - **`Filter`**: Field-equality conditions, all of which must hold.
//! - **`sqlite`**: The persistent backend (`SqliteStore`).
//! - **`memory`**: A process-local backend (`MemoryStore`) used by tests.
//!
//! Every stored document carries a backend-assigned identifier in the
//! [`ID_FIELD`] field. Callers that expose documents elsewhere (for example in
//! a model prompt) must strip it.
//!
//! ## Usage
//!
//! ```rust
//! let store = SqliteStore::open(Path::new("/tmp/ragchat.db")).await?;
//! store.insert_one("student", document).await?;
//! let alice = store.find_one("student", &Filter::new().eq("name", "Alice")).await?;
//! let mut recent = store.find("chats", Filter::all(), "created_at");
//! while let Some(doc) = recent.try_next().await? { /* ... */ }
//! ```
//!
use crate::core::error::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::{Map, Value};

/// Persistent SQLite backend.
pub mod sqlite;
/// In-process backend for tests.
#[cfg(test)]
pub mod memory;

#[cfg(test)]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Field holding the store-assigned identifier of a document.
pub const ID_FIELD: &str = "_id";

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Stream of documents produced by [`DocumentStore::find`].
pub type DocumentStream<'a> = BoxStream<'a, Result<Document>>;

/// Equality conditions on top-level document fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter with no conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches every document in a collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds the condition `document[field] == value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// True when `document` satisfies every condition. A missing field only
    /// matches a `null` condition.
    #[cfg(test)]
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            document.get(field).unwrap_or(&Value::Null) == expected
        })
    }
}

/// The operations the chat components need from a document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the first document in `collection` matching `filter`, if any.
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Stores `document` in `collection`. Any [`ID_FIELD`] in the input is
    /// replaced by the store's own identifier.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<()>;

    /// Scans `collection` for documents matching `filter`, ordered by
    /// `sort_field` descending (ties: most recently inserted first).
    ///
    /// Nothing is read until the stream is polled; calling `find` again starts
    /// a fresh scan.
    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: Filter,
        sort_field: &'a str,
    ) -> DocumentStream<'a>;
}
