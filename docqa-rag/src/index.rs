//! In-memory vector index using exact cosine similarity.
//!
//! [`VectorIndex`] is built once from every chunk of the knowledge document
//! and is read-only afterwards, so it can be shared between concurrent
//! requests without locking.

use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, UpstreamStage};

/// Embedded chunks in insertion order, searched by brute force.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::VectorIndex;
///
/// let index = VectorIndex::build(chunks, &embedder).await?;
/// let results = index.search(&query_embedding, 4)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    dimensions: usize,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex {
    /// Embed every chunk with `provider` and index the results.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UpstreamError`] if the provider fails, returns a
    /// different number of vectors than chunks, or returns vectors of
    /// inconsistent or zero dimension.
    pub async fn build(mut chunks: Vec<Chunk>, provider: &dyn EmbeddingProvider) -> Result<Self> {
        if chunks.is_empty() {
            return Ok(Self::default());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = provider.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::upstream(
                UpstreamStage::Embedding,
                provider.name(),
                format!("expected {} embeddings, received {}", chunks.len(), embeddings.len()),
            ));
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let index = Self::from_embedded(chunks).map_err(|e| match e {
            RagError::UpstreamError { stage, message, .. } => {
                RagError::UpstreamError { stage, provider: provider.name().to_string(), message }
            }
            other => other,
        })?;

        info!(
            provider = provider.name(),
            chunk_count = index.len(),
            dimensions = index.dimensions,
            "vector index built"
        );
        Ok(index)
    }

    /// Index chunks whose embeddings are already attached.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UpstreamError`] if any embedding is empty or the
    /// dimensions differ between chunks.
    pub fn from_embedded(chunks: Vec<Chunk>) -> Result<Self> {
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);

        for chunk in &chunks {
            if chunk.embedding.is_empty() {
                return Err(RagError::upstream(
                    UpstreamStage::Embedding,
                    "unknown",
                    format!("chunk '{}' has an empty embedding", chunk.id),
                ));
            }
            if chunk.embedding.len() != dimensions {
                return Err(RagError::upstream(
                    UpstreamStage::Embedding,
                    "unknown",
                    format!(
                        "chunk '{}' has {} dimensions, expected {dimensions}",
                        chunk.id,
                        chunk.embedding.len()
                    ),
                ));
            }
        }

        Ok(Self { chunks, dimensions })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Dimensionality shared by every indexed embedding (0 when empty).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Indexed chunks in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Return the `top_k` chunks most similar to `query`, nearest first.
    ///
    /// `top_k` is clamped to the index size. Equal scores keep insertion
    /// order, so results are deterministic for a fixed index and query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalError`] if the index is empty or the
    /// query dimension does not match the index.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if self.chunks.is_empty() {
            return Err(RagError::RetrievalError("vector index is empty".into()));
        }
        if query.len() != self.dimensions {
            return Err(RagError::RetrievalError(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let score = cosine_similarity(&chunk.embedding, query);
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        // stable: ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k.min(self.chunks.len()));

        debug!(requested = top_k, returned = scored.len(), "vector search");

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult { chunk: self.chunks[i].clone(), score })
            .collect())
    }
}
