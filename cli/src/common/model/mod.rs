//! # RagChat Model Client Interface
//!
//! File: cli/src/common/model/mod.rs
//!
//! ## Overview
//!
//! The hosted language model is reached through the [`ModelClient`] trait: one
//! content blob in, one answer out, with an optional system instruction.
//! Streaming, multi-turn history and function calling are not used.
//!
//! - **`gemini`**: The REST client for the Gemini `generateContent` endpoint.
//!
//! Calls are attempted exactly once; there is no retry layer anywhere in the
//! client, and timeouts are left to the HTTP client defaults.
//!
use crate::core::error::ModelError;
use async_trait::async_trait;

/// Client for the Gemini REST API.
pub mod gemini;

pub use gemini::GeminiClient;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generates an answer for `content`, steered by `instruction` when given.
    ///
    /// An empty answer is reported as [`ModelError::EmptyResponse`], never as
    /// `Ok("")`.
    async fn generate(
        &self,
        content: &str,
        instruction: Option<&str>,
    ) -> std::result::Result<String, ModelError>;
}
