//! # RagChat Domain Components
//!
//! File: cli/src/chat/mod.rs
//!
//! ## Overview
//!
//! The pieces a chat turn is made of, independent of any terminal handling:
//!
//! - `identity`: Who is asking, and which history they may read
//! - `exchange`: The persisted question/answer record
//! - `resolver`: Name matching and one-record lookup for prompt context
//! - `prompt`: Instruction and content sent to the model
//! - `log`: Append-only conversation history
//! - `session`: One turn, lookup then generate then persist
//!
//! Store and model handles are built once by the command layer and passed in,
//! so every component here can run against substitute collaborators.
//!
pub mod exchange;
pub mod identity;
pub mod log;
pub mod prompt;
pub mod resolver;
pub mod session;

#[cfg(test)]
mod testing;
