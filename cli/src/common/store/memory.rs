//! # In-Memory Document Store
//!
//! File: cli/src/common/store/memory.rs
//!
//! A `DocumentStore` that keeps collections in process memory. It exists so the
//! chat components can be exercised without a database file; nothing survives
//! the process.
//!
use super::{Document, DocumentStore, DocumentStream, Filter, ID_FIELD};
use crate::core::error::Result;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    collections: HashMap<String, Vec<(i64, Document)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the maps intact; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let inner = self.lock();
        Ok(inner.collections.get(collection).and_then(|docs| {
            docs.iter()
                .map(|(_, d)| d)
                .find(|d| filter.matches(d))
                .cloned()
        }))
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<()> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        document.insert(ID_FIELD.to_string(), Value::from(id));
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push((id, document));
        Ok(())
    }

    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: Filter,
        sort_field: &'a str,
    ) -> DocumentStream<'a> {
        stream::once(async move {
            let inner = self.lock();
            let mut hits: Vec<(i64, Document)> = inner
                .collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|(_, d)| filter.matches(d))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            hits.sort_by(|(id_a, a), (id_b, b)| {
                compare_values(b.get(sort_field), a.get(sort_field)).then(id_b.cmp(id_a))
            });
            hits.into_iter().map(|(_, d)| Ok(d)).collect::<Vec<_>>()
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

/// Orders values the way SQLite orders `json_extract` results: missing/null
/// first, then numbers, then strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) | Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_find_one() -> Result<()> {
        let store = MemoryStore::new();
        store
            .insert_one("student", doc(json!({"name": "Alice", "_id": "spoofed"})))
            .await?;

        let found = store
            .find_one("student", &Filter::new().eq("name", "Alice"))
            .await?
            .expect("record");
        assert_eq!(found.get(ID_FIELD), Some(&json!(1)));
        assert!(store
            .find_one("student", &Filter::new().eq("name", "Bob"))
            .await?
            .is_none());
        assert!(store
            .find_one("other", &Filter::all())
            .await?
            .is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_find_sorted_desc_with_ties() -> Result<()> {
        let store = MemoryStore::new();
        for (k, ts) in [("a", "2026-01-01"), ("b", "2026-03-01"), ("c", "2026-03-01"), ("d", "2026-02-01")] {
            store
                .insert_one("chats", doc(json!({"k": k, "ts": ts})))
                .await?;
        }

        let keys: Vec<String> = store
            .find("chats", Filter::all(), "ts")
            .map_ok(|d| d["k"].as_str().unwrap().to_string())
            .try_collect()
            .await?;
        assert_eq!(keys, vec!["c", "b", "d", "a"]);
        Ok(())
    }
}
