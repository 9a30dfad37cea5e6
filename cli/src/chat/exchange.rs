//! # Exchange Data Model
//!
//! File: cli/src/chat/exchange.rs
//!
//! An [`Exchange`] is one persisted question/answer turn. It is built from a
//! validated [`NewExchange`] at the moment it is written, which is also when it
//! receives its timestamp. Exchanges are never updated or deleted.
//!
//! Stored document layout:
//!
//! ```json
//! { "owner": "alice", "role": "standard", "question": "...", "answer": "...",
//!   "created_at": "2026-10-18T09:30:05.123456Z" }
//! ```
//!
//! `created_at` always carries six fractional digits and a `Z` suffix, so the
//! store can order it as text.
//!
use super::identity::{Identity, Role};
use crate::common::store::Document;
use crate::core::error::{ChatError, ModelError, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed, persisted question/answer turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub owner: String,
    pub role: Role,
    pub question: String,
    pub answer: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// An exchange waiting to be written. Construction enforces the non-empty
/// owner/question/answer invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExchange {
    owner: String,
    role: Role,
    question: String,
    answer: String,
}

impl NewExchange {
    pub fn new(
        identity: &Identity,
        question: &str,
        answer: &str,
    ) -> std::result::Result<Self, ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if answer.trim().is_empty() {
            return Err(ModelError::EmptyResponse.into());
        }
        Ok(Self {
            owner: identity.username().to_string(),
            role: identity.role(),
            question: question.to_string(),
            answer: answer.to_string(),
        })
    }

    /// Stamps the exchange with its creation time.
    pub fn at(self, created_at: DateTime<Utc>) -> Exchange {
        Exchange {
            owner: self.owner,
            role: self.role,
            question: self.question,
            answer: self.answer,
            created_at,
        }
    }
}

impl Exchange {
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self).context("Failed to encode exchange")? {
            serde_json::Value::Object(map) => Ok(map),
            other => anyhow::bail!("exchange encoded as non-object: {}", other),
        }
    }

    /// Decodes a stored document. Extra fields (such as the store id) are ignored.
    pub fn from_document(document: Document) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(document))
            .context("Stored exchange has an unexpected shape")
    }
}

/// Fixed-width RFC 3339 (microseconds, `Z`) so text order matches time order.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
