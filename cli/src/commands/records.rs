//! # RagChat Records Commands
//!
//! File: cli/src/commands/records.rs
//!
//! ## Overview
//!
//! Implements `ragchat records`, for seeding and inspecting the collection of
//! entity records that questions are answered from.
//!
//! - `add <json>`: Inserts one JSON object.
//! - `import <file>`: Inserts a JSON object or an array of objects from a file.
//!   Every record is validated before the first one is written.
//! - `show <name>`: Prints the context string a question mentioning `name`
//!   would receive.
//!
//! A record must be a JSON object whose name field (`retrieval.name_field`) is
//! a non-empty string, and must not carry the store-assigned `_id`.
//!
//! ```bash
//! ragchat records add '{"name": "Alice", "grade": "A", "age": 20}'
//! ragchat records import students.json
//! ragchat records show Alice
//! ```
//!
use super::{open_store, GlobalArgs};
use crate::chat::resolver::ContextResolver;
use crate::common::store::{Document, DocumentStore, ID_FIELD};
use crate::core::error::{ChatError, Result};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
pub struct RecordsArgs {
    #[command(subcommand)]
    command: RecordsCommand,
}

#[derive(Subcommand, Debug)]
enum RecordsCommand {
    /// Add one record given as a JSON object.
    Add {
        /// The record, e.g. '{"name": "Alice", "grade": "A"}'.
        json: String,
    },
    /// Import records from a JSON file (one object or an array of objects).
    Import {
        /// Path of the JSON file.
        file: PathBuf,
    },
    /// Show the context string stored for a name.
    Show {
        /// Exact value of the name field.
        name: String,
    },
}

pub async fn handle_records(global: &GlobalArgs, args: RecordsArgs) -> Result<()> {
    let config = global.load_config()?;
    let name_field = config.retrieval.name_field.as_str();
    let collection = config.store.records_collection.as_str();

    match args.command {
        RecordsCommand::Add { json } => {
            let value: Value = serde_json::from_str(&json).map_err(|e| {
                anyhow!(ChatError::InvalidRecord(format!("not valid JSON: {}", e)))
            })?;
            let record = validate_record(value, name_field)?;
            let store = open_store(&config).await?;
            let name = record_name(&record, name_field);
            store.insert_one(collection, record).await?;
            println!("Added record '{}' to '{}'.", name, collection);
        }
        RecordsCommand::Import { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read records file: {}", file.display()))?;
            let value: Value = serde_json::from_str(&content).map_err(|e| {
                anyhow!(ChatError::InvalidRecord(format!(
                    "{} is not valid JSON: {}",
                    file.display(),
                    e
                )))
            })?;
            let records = match value {
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| validate_record(item, name_field))
                    .collect::<Result<Vec<_>>>()?,
                other => vec![validate_record(other, name_field)?],
            };
            let store = open_store(&config).await?;
            let count = records.len();
            for record in records {
                store.insert_one(collection, record).await?;
            }
            info!("Imported {} records from {}", count, file.display());
            println!("Imported {} record(s) into '{}'.", count, collection);
        }
        RecordsCommand::Show { name } => {
            let store = open_store(&config).await?;
            let resolver = ContextResolver::new(store, collection, &config.retrieval);
            match resolver.lookup(&name).await? {
                Some(context) => println!("{}", context),
                None => println!("No record named '{}' in '{}'.", name, collection),
            }
        }
    }
    Ok(())
}

/// Checks that `value` can be stored as an entity record.
fn validate_record(value: Value, name_field: &str) -> Result<Document> {
    let record = match value {
        Value::Object(map) => map,
        other => {
            return Err(anyhow!(ChatError::InvalidRecord(format!(
                "expected a JSON object, got {}",
                other
            ))))
        }
    };
    if record.contains_key(ID_FIELD) {
        return Err(anyhow!(ChatError::InvalidRecord(format!(
            "'{}' is assigned by the store",
            ID_FIELD
        ))));
    }
    match record.get(name_field) {
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(record),
        _ => Err(anyhow!(ChatError::InvalidRecord(format!(
            "field '{}' must be a non-empty string",
            name_field
        )))),
    }
}

fn record_name(record: &Document, name_field: &str) -> String {
    record
        .get(name_field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
