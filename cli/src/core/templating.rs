//! # RagChat Template System
//!
//! File: cli/src/core/templating.rs
//!
//! ## Overview
//!
//! Renders history entries for the terminal using the Tera templating engine.
//! The template comes from `display.history_template` in the configuration, so
//! users can change how the history listing looks without touching code.
//!
//! Available variables: `owner`, `role`, `question`, `answer`, `created_at`
//! (formatted as `%Y-%m-%d %H:%M:%S`).
//!
use crate::chat::exchange::Exchange;
use crate::core::error::{ChatError, Result};
use anyhow::anyhow;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "history_entry";

/// A compiled history-entry template.
#[derive(Debug)]
pub struct HistoryRenderer {
    tera: Tera,
}

impl HistoryRenderer {
    /// Compiles `template`. Fails on syntax errors.
    pub fn new(template: &str) -> Result<Self> {
        let mut tera = Tera::default();
        // Plain-text output; nothing here is HTML.
        tera.autoescape_on(vec![]);
        tera.add_raw_template(TEMPLATE_NAME, template)
            .map_err(|e| anyhow!(ChatError::Template { source: e }))?;
        Ok(Self { tera })
    }

    /// Renders one exchange.
    pub fn render(&self, exchange: &Exchange) -> Result<String> {
        let mut context = Context::new();
        context.insert("owner", &exchange.owner);
        context.insert("role", exchange.role.as_str());
        context.insert("question", &exchange.question);
        context.insert("answer", &exchange.answer);
        context.insert(
            "created_at",
            &exchange.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| anyhow!(ChatError::Template { source: e }))
    }
}
