//! # Prompt Builder
//!
//! File: cli/src/chat/prompt.rs
//!
//! Turns a question and optional record context into what the model receives.
//!
//! - With context: a fixed instruction restricting the answer to the context,
//!   and `CONTEXT: <context>\n\nQUESTION: <question>` as content.
//! - Without context: no instruction, and the question verbatim as content.
//!
//! No truncation or token counting; at most one record is ever included.
//!

/// Sentence the model is told to give when the context lacks the answer.
pub const FALLBACK_SENTENCE: &str = "I cannot find that information in the student records";

/// What gets sent to the model for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instruction: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    instruction: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            instruction: format!(
                "You are an AI trained to answer questions about student data. \
                 Answer the user's question ONLY based on the CONTEXT provided below. \
                 If the specific answer is not in the context, state '{}'.",
                FALLBACK_SENTENCE
            ),
        }
    }
}

impl PromptBuilder {
    pub fn build(&self, question: &str, context: Option<&str>) -> Prompt {
        match context {
            Some(context) => Prompt {
                instruction: Some(self.instruction.clone()),
                content: format!("CONTEXT: {}\n\nQUESTION: {}", context, question),
            },
            None => Prompt {
                instruction: None,
                content: question.to_string(),
            },
        }
    }
}
