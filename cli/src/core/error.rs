//! # RagChat Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout the ragchat application.
//! Every failure a chat turn can run into maps onto one of the variants below,
//! so the command handlers can decide whether a failure ends the turn, gets
//! downgraded to a warning, or disables part of the session.
//!
//! ## Architecture
//!
//! The error system consists of three pieces:
//! - `ChatError`: The application error enum, derived with `thiserror`.
//! - `ModelError`: Failures of the hosted model call, kept separate so the model
//!   client can be used and tested on its own.
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible propagation.
//!
//! The variants follow the failure classes of a turn:
//! - `StoreUnavailable`: The document store could not be opened at startup.
//!   Lookup and persistence are disabled for the session.
//! - `LookupFailure`: A single record lookup failed. Logged and treated as
//!   "no context".
//! - `Model`: The model call failed or came back empty. Reported for the turn,
//!   nothing is persisted.
//! - `Persistence`: Writing the exchange failed after a successful answer.
//!   Reported as a warning; the answer is still shown.
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if username.trim().is_empty() {
//!     return Err(ChatError::InvalidIdentity("username must not be empty".into()))?;
//! }
//!
//! // Check for a specific failure class
//! match result {
//!     Err(e) if e.downcast_ref::<ChatError>().map_or(false, |ce| matches!(ce, ChatError::StoreUnavailable(_))) => {
//!         println!("Running without history.");
//!     }
//!     other => other?,
//! }
//! ```
//!
use thiserror::Error;

/// Custom error type for the ragchat application.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Record lookup failed: {0}")]
    LookupFailure(String),

    #[error("Model request failed: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Failed to save exchange: {0}")]
    Persistence(String),

    #[error("Question must not be empty.")]
    EmptyQuestion,

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("User '{user}' is not allowed to view the history of '{owner}'.")]
    Forbidden { user: String, owner: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Template rendering error: {source}")]
    Template {
        #[from]
        source: tera::Error,
    },
}

/// Failures of a single call to the hosted model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("no API key configured; set GEMINI_API_KEY or pass --api-key")]
    MissingApiKey,

    #[error("request could not be sent: {0}")]
    Transport(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("the model did not return any answer")]
    EmptyResponse,

    #[error("unexpected response payload: {0}")]
    MalformedResponse(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
