//! Traits for embedding operations.
//!
//! The retriever never talks to a model directly; it consumes this trait so
//! that any embedding backend (local model, remote API, test double) can be
//! swapped without changing dependent code.

use crate::error::EmbeddingError;
use std::sync::Arc;

/// Trait for embedding model operations.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: a retriever shared across threads
/// embeds queries from whichever thread is searching.
///
/// # Examples
///
/// ```
/// use hybridrag_core::embedding::{Embedder, HashingEmbedder};
///
/// let embedder = HashingEmbedder::new(64);
/// let embedding = embedder.embed("hybrid retrieval").unwrap();
/// assert_eq!(embedding.len(), embedder.embedding_dim());
/// ```
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimension (vector size).
    ///
    /// All embeddings from this model will have this length.
    fn embedding_dim(&self) -> usize;

    /// Generates an embedding for one text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Generates embeddings for a batch of texts, one per input in order.
    ///
    /// The default implementation calls [`embed`](Embedder::embed) for each
    /// text; backends with real batching should override it.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_batch(texts)
    }
}
