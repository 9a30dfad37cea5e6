//! # Chat Identity and History Scope
//!
//! File: cli/src/chat/identity.rs
//!
//! ## Overview
//!
//! Who is asking, and which part of the history they may read. The role is a
//! label carried on every exchange; the only place it changes behavior is
//! [`Identity::history_scope`], the guard that turns a history request into an
//! already-authorized [`Scope`] before the log is queried.
//!
//! | Role         | `--owner` omitted | `--owner <self>` | `--owner <other>` |
//! |--------------|-------------------|------------------|-------------------|
//! | `standard`   | own exchanges     | own exchanges    | refused           |
//! | `privileged` | all exchanges     | own exchanges    | that owner's      |
//!
use crate::core::error::ChatError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Informational role tag of the asker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Standard,
    Privileged,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Privileged => "privileged",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated asker: non-empty username plus role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    role: Role,
}

/// The part of the history a caller is allowed to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Owner(String),
    All,
}

impl Identity {
    /// Fails with `ChatError::InvalidIdentity` for a blank username. Surrounding
    /// whitespace is dropped.
    pub fn new(username: &str, role: Role) -> Result<Self, ChatError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChatError::InvalidIdentity(
                "enter a username (--user or RAGCHAT_USER) to start chatting".into(),
            ));
        }
        Ok(Self {
            username: username.to_string(),
            role,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Resolves which history this identity may list.
    pub fn history_scope(&self, requested_owner: Option<&str>) -> Result<Scope, ChatError> {
        let requested_owner = requested_owner.map(str::trim).filter(|o| !o.is_empty());
        match (self.role, requested_owner) {
            (Role::Privileged, None) => Ok(Scope::All),
            (Role::Privileged, Some(owner)) => Ok(Scope::Owner(owner.to_string())),
            (Role::Standard, None) => Ok(Scope::Owner(self.username.clone())),
            (Role::Standard, Some(owner)) if owner == self.username => {
                Ok(Scope::Owner(self.username.clone()))
            }
            (Role::Standard, Some(owner)) => Err(ChatError::Forbidden {
                user: self.username.clone(),
                owner: owner.to_string(),
            }),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}
