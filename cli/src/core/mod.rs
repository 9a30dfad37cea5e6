//! # RagChat Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the core infrastructure components shared by every
//! command:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types and the crate-wide `Result` alias
//! - `templating`: Tera rendering of history entries
//!
//! ```rust
//! use crate::core::config;
//! use crate::core::error::{ChatError, Result};
//! use crate::core::templating::HistoryRenderer;
//! ```
//!
pub mod config;
pub mod error;
pub mod templating;
