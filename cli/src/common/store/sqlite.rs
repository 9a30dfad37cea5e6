//! # SQLite Document Store
//!
//! File: cli/src/common/store/sqlite.rs
//!
//! ## Overview
//!
//! Persists JSON documents in a single SQLite table using `sqlx`. Each row holds
//! the collection name and the document body as JSON text; the row id is
//! surfaced to callers as the document's [`ID_FIELD`].
//!
//! ## Architecture
//!
//! ```text
//! documents(id INTEGER PRIMARY KEY AUTOINCREMENT,
//!           collection TEXT NOT NULL,
//!           body TEXT NOT NULL CHECK(json_valid(body)))
//! ```
//!
//! - Equality filters compile to `json_extract(body, '$."field"') IS ?`, which
//!   also matches a `null` condition against a missing field.
//! - Sorted scans order by `json_extract(body, '$."field"') DESC, id DESC`.
//!   Timestamps are stored as fixed-width RFC 3339 strings, so text order is
//!   time order.
//!
use super::{Document, DocumentStore, DocumentStream, Filter, ID_FIELD};
use crate::core::error::{ChatError, Result};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite, SqlitePool};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::StoreUnavailable` when the file cannot be created or
    /// opened, or the schema cannot be applied.
    #[instrument]
    pub async fn open(path: &Path) -> Result<Self> {
        let unavailable = |e: &dyn std::fmt::Display| {
            anyhow!(ChatError::StoreUnavailable(format!(
                "{}: {}",
                path.display(),
                e
            )))
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(&e))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| unavailable(&e))?;

        let store = Self {
            path: path.to_path_buf(),
            pool,
        };
        store.init_schema().await.map_err(|e| unavailable(&e))?;
        info!("Opened document store at {}", path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn init_schema(&self) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                body TEXT NOT NULL CHECK(json_valid(body))
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, id)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    #[instrument(skip(self))]
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let sql = format!(
            "SELECT id, body FROM documents WHERE collection = ?{} ORDER BY id ASC LIMIT 1",
            where_clause(filter)
        );
        let query = bind_filter(sqlx::query(&sql).bind(collection), filter);
        let row = query
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to query collection '{}'", collection))?;
        row.map(document_from_row).transpose()
    }

    #[instrument(skip(self, document))]
    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<()> {
        document.shift_remove(ID_FIELD);
        let body = serde_json::to_string(&document).context("Failed to encode document")?;
        let result = sqlx::query("INSERT INTO documents (collection, body) VALUES (?1, ?2)")
            .bind(collection)
            .bind(body)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert into collection '{}'", collection))?;
        debug!(
            "Inserted document {} into '{}'",
            result.last_insert_rowid(),
            collection
        );
        Ok(())
    }

    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: Filter,
        sort_field: &'a str,
    ) -> DocumentStream<'a> {
        stream::once(async move {
            let sql = format!(
                "SELECT id, body FROM documents WHERE collection = ?{} \
                 ORDER BY json_extract(body, ?) DESC, id DESC",
                where_clause(&filter)
            );
            let query = bind_filter(sqlx::query(&sql).bind(collection), &filter)
                .bind(json_path(sort_field));
            let rows = query
                .fetch_all(&self.pool)
                .await
                .with_context(|| format!("Failed to scan collection '{}'", collection));
            match rows {
                Ok(rows) => rows.into_iter().map(document_from_row).collect(),
                Err(e) => vec![Err(e)],
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

/// SQLite JSON path for a top-level field, quoted so any key is addressable.
fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

fn where_clause(filter: &Filter) -> String {
    " AND json_extract(body, ?) IS ?".repeat(filter.conditions().len())
}

fn bind_filter<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    filter: &Filter,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for (field, value) in filter.conditions() {
        query = query.bind(json_path(field));
        // json_extract yields SQL values: integers for booleans, text for
        // nested JSON.
        query = match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => query.bind(s.clone()),
            other => query.bind(other.to_string()),
        };
    }
    query
}

fn document_from_row(row: SqliteRow) -> Result<Document> {
    let id: i64 = row.try_get("id")?;
    let body: String = row.try_get("body")?;
    let mut document: Document = serde_json::from_str(&body)
        .with_context(|| format!("Stored document {} is not a JSON object", id))?;
    document.insert(ID_FIELD.to_string(), Value::from(id));
    Ok(document)
}
