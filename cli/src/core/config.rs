//! # RagChat Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements loading, merging, validation, and access to the
//! ragchat configuration. It supports a multi-level approach that combines
//! defaults, user settings, and project-specific overrides.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. An explicit file passed with `--config` (replaces 2 and 3 entirely)
//! 2. Project-specific `.ragchat.toml` in the current directory or ancestors
//! 3. User-specific `<config dir>/ragchat/config.toml`
//! 4. Default values defined in the code
//!
//! Command-line flags such as `--store` are applied on top by the command
//! handlers after loading. The API key is never read from these files; it comes
//! from `GEMINI_API_KEY` or `--api-key` only.
//!
//! ## Examples
//!
//! ```toml
//! [model]
//! name = "gemini-2.5-flash"
//!
//! [store]
//! path = "~/chat/ragchat.db"
//! records_collection = "student"
//! history_collection = "chats"
//!
//! [retrieval]
//! names = ["Alice", "Bob", "Charlie"]
//! label = "Student Record"
//! ```
//!
//! ```rust
//! let cfg = config::load_config(None)?;
//! let names = &cfg.retrieval.names;
//! let db_path = &cfg.store.path;
//! ```
//!
use crate::core::error::{ChatError, Result};
use crate::core::templating::HistoryRenderer;
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Settings for the hosted model.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model identifier sent in the request path.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Base URL of the generative language API.
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
}

/// Settings for the document store.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the SQLite database file (can use ~). Will be expanded.
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Collection holding the entity records the resolver reads.
    #[serde(default = "default_records_collection")]
    pub records_collection: String,
    /// Collection holding the persisted exchanges.
    #[serde(default = "default_history_collection")]
    pub history_collection: String,
}

/// Settings for the record lookup.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Recognized entity names, checked in order. The first one found wins.
    #[serde(default = "default_names")]
    pub names: Vec<String>,
    /// Label prefixed to the rendered record.
    #[serde(default = "default_label")]
    pub label: String,
    /// Record field compared against the matched name.
    #[serde(default = "default_name_field")]
    pub name_field: String,
}

/// Settings for terminal output.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Tera template used to render one history entry.
    #[serde(default = "default_history_template")]
    pub history_template: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_model_base_url(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            records_collection: default_records_collection(),
            history_collection: default_history_collection(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            names: default_names(),
            label: default_label(),
            name_field: default_name_field(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            history_template: default_history_template(),
        }
    }
}

fn default_model_name() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_store_path() -> String {
    match dirs::data_dir() {
        Some(dir) => dir
            .join("ragchat")
            .join("ragchat.db")
            .to_string_lossy()
            .into_owned(),
        None => "~/.ragchat/ragchat.db".to_string(),
    }
}
fn default_records_collection() -> String {
    "student".to_string()
}
fn default_history_collection() -> String {
    "chats".to_string()
}
fn default_names() -> Vec<String> {
    vec!["Alice".to_string(), "Bob".to_string(), "Charlie".to_string()]
}
fn default_label() -> String {
    "Student Record".to_string()
}
fn default_name_field() -> String {
    "name".to_string()
}
fn default_history_template() -> String {
    "{{ owner }} ({{ role }})  {{ created_at }}\n  Q: {{ question }}\n  A: {{ answer }}\n"
        .to_string()
}

const PROJECT_CONFIG_FILENAME: &str = ".ragchat.toml";

/// Loads the effective configuration.
///
/// With `explicit` set, only that file (plus defaults) is used. Otherwise the
/// user and project files are discovered and merged.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(path)?
        }
        None => {
            let user_config = load_user_config()?;
            let project_config = load_project_config()?;
            merge_configs(user_config.unwrap_or_default(), project_config)
        }
    };
    expand_config_paths(&mut config).context("Failed to expand paths in configuration")?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "RagChat", "ragchat") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.ragchat.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

/// Walks up from `start` looking for `.ragchat.toml`, stopping at a `.git` root.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win over user values wherever the project file moved away
/// from the built-in default.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project = match project {
        Some(p) => p,
        None => return user,
    };

    fn pick<T: PartialEq>(project: T, user: T, default: T) -> T {
        if project != default {
            project
        } else {
            user
        }
    }

    Config {
        model: ModelConfig {
            name: pick(project.model.name, user.model.name, default_model_name()),
            base_url: pick(
                project.model.base_url,
                user.model.base_url,
                default_model_base_url(),
            ),
        },
        store: StoreConfig {
            path: pick(project.store.path, user.store.path, default_store_path()),
            records_collection: pick(
                project.store.records_collection,
                user.store.records_collection,
                default_records_collection(),
            ),
            history_collection: pick(
                project.store.history_collection,
                user.store.history_collection,
                default_history_collection(),
            ),
        },
        retrieval: RetrievalConfig {
            names: pick(project.retrieval.names, user.retrieval.names, default_names()),
            label: pick(project.retrieval.label, user.retrieval.label, default_label()),
            name_field: pick(
                project.retrieval.name_field,
                user.retrieval.name_field,
                default_name_field(),
            ),
        },
        display: DisplayConfig {
            history_template: pick(
                project.display.history_template,
                user.display.history_template,
                default_history_template(),
            ),
        },
    }
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    config.store.path = shellexpand::tilde(&config.store.path).into_owned();
    debug!("Expanded store path: {}", config.store.path);
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    let invalid = |msg: String| anyhow!(ChatError::Config(msg));

    if config.model.name.trim().is_empty() {
        return Err(invalid("model.name must not be empty.".into()));
    }
    if !config.model.base_url.starts_with("http://")
        && !config.model.base_url.starts_with("https://")
    {
        return Err(invalid(format!(
            "model.base_url '{}' must be an http(s) URL.",
            config.model.base_url
        )));
    }
    if config.store.path.trim().is_empty() {
        return Err(invalid("store.path must not be empty.".into()));
    }
    if config.store.records_collection.is_empty() || config.store.history_collection.is_empty() {
        return Err(invalid("Collection names must not be empty.".into()));
    }
    if config.store.records_collection == config.store.history_collection {
        return Err(invalid(format!(
            "records_collection and history_collection must differ (both '{}').",
            config.store.records_collection
        )));
    }
    if config.retrieval.names.is_empty() {
        return Err(invalid("retrieval.names must list at least one name.".into()));
    }
    if let Some(blank) = config.retrieval.names.iter().position(|n| n.trim().is_empty()) {
        return Err(invalid(format!(
            "retrieval.names entry #{} is blank.",
            blank + 1
        )));
    }
    if config.retrieval.label.trim().is_empty() || config.retrieval.name_field.trim().is_empty() {
        return Err(invalid(
            "retrieval.label and retrieval.name_field must not be empty.".into(),
        ));
    }
    HistoryRenderer::new(&config.display.history_template)
        .context("display.history_template is not a valid template")?;
    Ok(())
}
