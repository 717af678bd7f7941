//! Answer pipeline orchestrator.
//!
//! The [`AnswerPipeline`] owns the whole question-answering workflow. It is
//! initialized once (read → chunk → embed → index) and then answers any
//! number of questions concurrently (embed → search → prompt → complete).
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{AnswerPipeline, MockEmbeddingProvider, PipelineConfig};
//! use docqa_model::MockChatModel;
//!
//! let pipeline = AnswerPipeline::builder()
//!     .config(PipelineConfig::default())
//!     .embedding_provider(Arc::new(MockEmbeddingProvider::new(64)))
//!     .chat_model(Arc::new(MockChatModel::new()))
//!     .build()?;
//!
//! pipeline.initialize().await?;
//! let answer = pipeline.answer("How long is the warranty?").await?;
//! ```

use std::sync::{Arc, OnceLock};

use docqa_model::{ChatModel, ChatRequest};
use tracing::{debug, error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::PipelineConfig;
use crate::document::{Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, UpstreamStage};
use crate::index::VectorIndex;
use crate::prompt::PromptTemplate;

/// The answer pipeline.
///
/// Holds the providers and, after [`initialize()`](AnswerPipeline::initialize),
/// the read-only [`VectorIndex`]. Share it behind an `Arc`; no method takes
/// `&mut self`.
pub struct AnswerPipeline {
    config: PipelineConfig,
    prompt: PromptTemplate,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chat_model: Arc<dyn ChatModel>,
    chunker: Arc<dyn Chunker>,
    index: OnceLock<VectorIndex>,
}

impl AnswerPipeline {
    /// Create a new [`AnswerPipelineBuilder`].
    pub fn builder() -> AnswerPipelineBuilder {
        AnswerPipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.index.get().is_some()
    }

    /// Number of indexed chunks (0 before initialization).
    pub fn chunk_count(&self) -> usize {
        self.index.get().map_or(0, VectorIndex::len)
    }

    /// Load the knowledge document and build the vector index.
    ///
    /// Must be called exactly once before [`answer()`](AnswerPipeline::answer).
    ///
    /// # Errors
    ///
    /// - [`RagError::ConfigError`] if the knowledge file is missing or
    ///   unreadable, yields no chunks, or the pipeline is already initialized.
    /// - [`RagError::UpstreamError`] if embedding the chunks fails.
    pub async fn initialize(&self) -> Result<()> {
        if self.is_initialized() {
            return Err(RagError::ConfigError("pipeline is already initialized".into()));
        }

        let path = &self.config.knowledge_path;
        let document = Document::from_path(path).await.inspect_err(|e| {
            error!(path = %path.display(), error = %e, "failed to read knowledge document");
        })?;
        info!(path = %path.display(), bytes = document.text.len(), "document read");

        let chunks = self.chunker.chunk(&document);
        if chunks.is_empty() {
            error!(path = %path.display(), "knowledge document has no content");
            return Err(RagError::ConfigError(format!(
                "knowledge file {} contains no text",
                path.display()
            )));
        }
        info!(document.id = %document.id, chunk_count = chunks.len(), "document chunked");

        let index = VectorIndex::build(chunks, self.embedding_provider.as_ref())
            .await
            .inspect_err(|e| {
                error!(stage = "embedding", kind = e.kind(), error = %e, "index build failed");
            })?;

        let chunk_count = index.len();
        let dimensions = index.dimensions();
        self.index
            .set(index)
            .map_err(|_| RagError::ConfigError("pipeline is already initialized".into()))?;

        info!(chunk_count, dimensions, "index built");
        Ok(())
    }

    /// Embed `query` and return the `top_k` most similar chunks, nearest first.
    ///
    /// # Errors
    ///
    /// - [`RagError::ConfigError`] if the pipeline is not initialized.
    /// - [`RagError::UpstreamError`] if embedding the query fails.
    /// - [`RagError::RetrievalError`] if the index cannot serve the search.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let index = self.index.get().ok_or_else(|| {
            RagError::ConfigError("pipeline used before initialize()".into())
        })?;

        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| match e {
            RagError::UpstreamError { .. } => e,
            other => RagError::upstream(
                UpstreamStage::Embedding,
                self.embedding_provider.name(),
                other.to_string(),
            ),
        })?;

        let results = index.search(&query_embedding, self.config.top_k)?;
        info!(result_count = results.len(), top_k = self.config.top_k, "context retrieved");
        Ok(results)
    }

    /// Answer `query` from the knowledge document.
    ///
    /// Returns the trimmed text of the first completion candidate.
    ///
    /// # Errors
    ///
    /// - [`RagError::ConfigError`] if the pipeline is not initialized.
    /// - [`RagError::UpstreamError`] if embedding or completion fails, or the
    ///   model returns no candidates or only whitespace.
    /// - [`RagError::RetrievalError`] if the index cannot serve the search.
    pub async fn answer(&self, query: &str) -> Result<String> {
        info!(query_len = query.chars().count(), "question received");

        self.run(query).await.inspect_err(|e| {
            let stage = e.stage().map(|s| s.to_string());
            error!(kind = e.kind(), stage = stage.as_deref(), error = %e, "answer failed");
        })
    }

    async fn run(&self, query: &str) -> Result<String> {
        let results = self.retrieve(query).await?;
        let context = PromptTemplate::build_context(&results);

        let mut request = ChatRequest::new(&self.config.chat_model)
            .with_temperature(self.config.temperature);
        request.messages = self.prompt.messages(&context, query);

        info!(
            model = %self.config.chat_model,
            context_chars = context.chars().count(),
            "dispatching completion"
        );

        let provider = self.chat_model.name();
        let response = self.chat_model.complete(request).await.map_err(|e| {
            RagError::upstream(UpstreamStage::Completion, provider, e.to_string())
        })?;
        info!(candidates = response.candidates.len(), "completion received");

        let text = response
            .first_text()
            .ok_or_else(|| {
                RagError::upstream(UpstreamStage::Completion, provider, "no candidates returned")
            })?
            .trim();

        if text.is_empty() {
            return Err(RagError::upstream(
                UpstreamStage::Completion,
                provider,
                "first candidate is empty",
            ));
        }

        debug!(answer_chars = text.chars().count(), "answer ready");
        Ok(text.to_string())
    }
}

/// Builder for constructing an [`AnswerPipeline`].
///
/// `embedding_provider` and `chat_model` are required. The config defaults to
/// [`PipelineConfig::default()`] and the chunker to
/// `RecursiveChunker::new(config.chunk_size)`.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = AnswerPipeline::builder()
///     .config(config)
///     .embedding_provider(Arc::new(embedder))
///     .chat_model(Arc::new(model))
///     .chunker(Arc::new(RecursiveChunker::new(500)))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct AnswerPipelineBuilder {
    config: Option<PipelineConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl AnswerPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used for both chunks and queries.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Override the chunking strategy.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`AnswerPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required provider is missing or
    /// the configuration is invalid.
    pub fn build(self) -> Result<AnswerPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".into()))?;
        let chat_model =
            self.chat_model.ok_or_else(|| RagError::ConfigError("chat_model is required".into()))?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(RecursiveChunker::new(config.chunk_size)));

        Ok(AnswerPipeline {
            prompt: PromptTemplate::new(config.system_instruction.clone()),
            config,
            embedding_provider,
            chat_model,
            chunker,
            index: OnceLock::new(),
        })
    }
}
