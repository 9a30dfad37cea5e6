//! # RagChat External Collaborators (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Narrow interfaces to the two services a chat turn depends on, together with
//! their implementations:
//!
//! - **`store`**: The `DocumentStore` trait, with a SQLite backend for real use
//!   and an in-memory backend for tests.
//! - **`model`**: The `ModelClient` trait and the Gemini REST client.
//!
//! ```rust
//! use crate::common::model::{GeminiClient, ModelClient};
//! use crate::common::store::{DocumentStore, SqliteStore};
//! ```
//!

/// Hosted language model access.
pub mod model;
/// Document storage: records and conversation history.
pub mod store;
