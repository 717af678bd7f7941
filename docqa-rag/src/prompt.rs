//! Prompt composition for grounded answers.

use docqa_model::ChatMessage;

use crate::document::SearchResult;

/// System message used when none is configured.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a consultant of the company. \
Answer the customer's question based on the information document. \
Do not invent anything yourself; answer as closely to the document as possible. \
Do not mention the information document to the customer. \
The customer must not know anything about the information document.";

/// Builds the `[system, user]` message pair sent to the chat model.
///
/// Composition is pure: the same context and question always produce the
/// same messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system_instruction: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_INSTRUCTION)
    }
}

impl PromptTemplate {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self { system_instruction: system_instruction.into() }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Join retrieved chunk texts, in rank order, with a single newline.
    pub fn build_context(results: &[SearchResult]) -> String {
        results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n")
    }

    /// Render the user message for `context` and `query`.
    pub fn user_message(&self, context: &str, query: &str) -> String {
        format!(
            "Answer the customer's question. \
             Do not mention the information document in your answer.\n\
             Context for the answer:\n\
             {context}\n\
             \n\
             Customer question:\n\
             {query}"
        )
    }

    pub fn messages(&self, context: &str, query: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_instruction.clone()),
            ChatMessage::user(self.user_message(context, query)),
        ]
    }
}
