//! # Conversation Log
//!
//! File: cli/src/chat/log.rs
//!
//! ## Overview
//!
//! Append-only history of exchanges, kept in one collection of the document
//! store.
//!
//! - `append` stamps and writes one exchange. It is attempted once; failures
//!   come back as `ChatError::Persistence` for the caller to report.
//! - `list` returns the exchanges in a [`Scope`], newest first, as a lazy
//!   stream. The scope must already be authorized (see
//!   [`Identity::history_scope`](super::identity::Identity::history_scope)).
//!
//! Timestamps come from one process-wide clock, shared by every log, that
//! never goes backwards. They are truncated to microseconds so they survive
//! the round trip through the store unchanged.
//!
use super::exchange::{Exchange, NewExchange};
use super::identity::Scope;
use crate::common::store::{DocumentStore, Filter};
use crate::core::error::{ChatError, Result};
use anyhow::anyhow;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use futures_util::stream::{BoxStream, StreamExt};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};

const CREATED_AT_FIELD: &str = "created_at";
const OWNER_FIELD: &str = "owner";

pub struct ConversationLog {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ConversationLog {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str) -> Self {
        Self {
            store,
            collection: collection.to_string(),
        }
    }

    /// Writes `entry`, returning the stored exchange.
    #[instrument(skip(self, entry))]
    pub async fn append(&self, entry: NewExchange) -> Result<Exchange> {
        let exchange = entry.at(next_timestamp());
        let document = exchange.to_document()?;
        self.store
            .insert_one(&self.collection, document)
            .await
            .map_err(|e| anyhow!(ChatError::Persistence(format!("{:#}", e))))?;
        debug!("Saved exchange for '{}'", exchange.owner);
        Ok(exchange)
    }

    /// Exchanges in `scope`, ordered by creation time descending.
    ///
    /// Stored documents that do not decode as exchanges are skipped with a
    /// warning.
    pub fn list<'a>(&'a self, scope: &Scope) -> BoxStream<'a, Result<Exchange>> {
        let filter = match scope {
            Scope::Owner(owner) => Filter::new().eq(OWNER_FIELD, owner.as_str()),
            Scope::All => Filter::all(),
        };
        self.store
            .find(&self.collection, filter, CREATED_AT_FIELD)
            .filter_map(|item| async move {
                match item {
                    Ok(document) => match Exchange::from_document(document) {
                        Ok(exchange) => Some(Ok(exchange)),
                        Err(e) => {
                            warn!("Skipping history entry: {:#}", e);
                            None
                        }
                    },
                    Err(e) => Some(Err(e)),
                }
            })
            .boxed()
    }
}

/// Last timestamp handed out in this process, shared by every log.
static LAST_STAMP: Mutex<Option<DateTime<Utc>>> = Mutex::new(None);

/// Current UTC time, truncated to microseconds and never earlier than any
/// timestamp this process handed out before.
fn next_timestamp() -> DateTime<Utc> {
    let mut last = LAST_STAMP.lock().unwrap_or_else(|e| e.into_inner());
    advance(&mut last, Utc::now())
}

fn advance(last: &mut Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now
        .duration_trunc(TimeDelta::microseconds(1))
        .unwrap_or(now);
    let stamp = match *last {
        Some(prev) if prev > now => prev,
        _ => now,
    };
    *last = Some(stamp);
    stamp
}
