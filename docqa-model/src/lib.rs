//! # docqa-model
//!
//! Chat-completion model integrations for docqa.
//!
//! ## Overview
//!
//! This crate provides the chat-completion boundary used by the answer
//! pipeline. It currently supports:
//!
//! - [`OpenAIChatModel`] - OpenAI and OpenAI-compatible chat completion APIs
//! - [`MockChatModel`] - Scripted model for testing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_model::{ChatMessage, ChatModel, ChatRequest, OpenAIChatModel};
//!
//! let model = OpenAIChatModel::new(std::env::var("OPENAI_API_KEY")?)?;
//! let request = ChatRequest::new("gpt-4")
//!     .with_message(ChatMessage::system("You are a helpful assistant."))
//!     .with_message(ChatMessage::user("Hello"))
//!     .with_temperature(0.0);
//! let response = model.complete(request).await?;
//! println!("{}", response.first_text().unwrap_or_default());
//! ```
//!
//! Requests are single-shot: no conversation history is kept between calls
//! and failed calls are never retried.

pub mod error;
pub mod mock;
pub mod openai;
pub mod types;

pub use error::{ModelError, Result};
pub use mock::MockChatModel;
pub use openai::OpenAIChatModel;
pub use types::{Candidate, ChatMessage, ChatModel, ChatRequest, ChatResponse, Role};
