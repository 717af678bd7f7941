//! # docqa-rag
//!
//! Retrieval-augmented question answering over one knowledge document.
//!
//! ## Overview
//!
//! - [`RecursiveChunker`] splits the document into overlap-free chunks of at
//!   most `chunk_size` characters, preferring paragraph, line, sentence and
//!   word boundaries in that order.
//! - [`EmbeddingProvider`] maps text to vectors ([`OpenAIEmbeddingProvider`],
//!   [`MockEmbeddingProvider`]).
//! - [`VectorIndex`] holds the embedded chunks and answers exact cosine
//!   nearest-neighbour queries.
//! - [`AnswerPipeline`] ties it together: `initialize()` once at startup,
//!   then `answer()` per question.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_model::OpenAIChatModel;
//! use docqa_rag::{AnswerPipeline, OpenAIEmbeddingProvider, PipelineConfig};
//!
//! let pipeline = AnswerPipeline::builder()
//!     .config(PipelineConfig::builder().knowledge_path("knowledge.txt").build()?)
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .chat_model(Arc::new(OpenAIChatModel::from_env()?))
//!     .build()?;
//!
//! pipeline.initialize().await?;
//! let answer = pipeline.answer("What does the policy exclude?").await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod mock;
pub mod openai;
pub mod pipeline;
pub mod prompt;

pub use chunking::{Chunker, Fragment, RecursiveChunker, Splits};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result, UpstreamStage};
pub use index::VectorIndex;
pub use mock::MockEmbeddingProvider;
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{AnswerPipeline, AnswerPipelineBuilder};
pub use prompt::PromptTemplate;
