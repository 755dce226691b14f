use super::Embedder;
use crate::error::EmbeddingError;
use crate::tokenization::{Tokenizer, WordTokenizer};
use fnv::FnvHasher;
use std::hash::Hasher;
use std::sync::Arc;

/// Bag-of-terms embedder using signed feature hashing.
///
/// Each token is hashed with FNV-1a into one of `dimension` buckets; the
/// hash's top bit picks the sign. The result is L2-normalized, so texts that
/// share terms have positive cosine similarity. Hashing is stable across
/// platforms and releases, which keeps persisted vectors compatible with
/// query vectors produced later.
///
/// Text without any token embeds to the zero vector.
#[derive(Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl HashingEmbedder {
    /// Creates an embedder over the default English tokenizer.
    pub fn new(dimension: usize) -> Self {
        Self::with_tokenizer(dimension, Arc::new(WordTokenizer::default()))
    }

    pub fn with_tokenizer(dimension: usize, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            dimension,
            tokenizer,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn embedding_dim(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "embedding dimension must be > 0".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in self.tokenizer.tokenize(text) {
            let mut hasher = FnvHasher::default();
            hasher.write(token.as_bytes());
            let hash = hasher.finish();
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }
}

impl std::fmt::Debug for HashingEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingEmbedder")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::cosine_similarity;

    #[test]
    fn test_embedding_is_normalized() {
        let embedder = HashingEmbedder::new(64);
        let embedding = embedder.embed("vector search with cosine similarity").unwrap();
        assert_eq!(embedding.len(), 64);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashingEmbedder::new(32);
        assert_eq!(
            embedder.embed("deterministic output").unwrap(),
            embedder.embed("deterministic output").unwrap()
        );
    }

    #[test]
    fn test_shared_terms_are_similar() {
        let embedder = HashingEmbedder::new(256);
        let a = embedder.embed("rust programming language").unwrap();
        let b = embedder.embed("programming in rust").unwrap();
        let same = cosine_similarity(&a, &b);
        assert!(same > 0.5, "similarity was {same}");
    }

    #[test]
    fn test_stop_words_only_embed_to_zero() {
        let embedder = HashingEmbedder::new(16);
        let embedding = embedder.embed("the and of").unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let embedder = HashingEmbedder::new(0);
        assert!(matches!(
            embedder.embed("text"),
            Err(EmbeddingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_default_batch_matches_single() {
        let embedder = HashingEmbedder::new(32);
        let batch = embedder.embed_batch(&["alpha", "beta gamma"]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], embedder.embed("beta gamma").unwrap());
    }
}
