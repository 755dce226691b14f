//! Retrieval configuration.
//!
//! Constants define the production defaults; [`RetrievalConfig`] bundles them
//! into the runtime configuration accepted by the
//! [`Retriever`](crate::search::Retriever).
//!
//! # Usage
//!
//! ```
//! use hybridrag_core::config::{RetrievalConfig, BM25_K1};
//!
//! let config = RetrievalConfig::default();
//! assert_eq!(config.bm25.k1, BM25_K1);
//! config.validate().unwrap();
//! ```

use crate::error::{Result, SearchError};
use crate::tokenization::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// BM25 Scoring
// =============================================================================

/// BM25 term-frequency saturation parameter.
///
/// Higher values let repeated terms keep contributing to the score for longer
/// before saturating.
pub const BM25_K1: f64 = 1.5;

/// BM25 document-length normalization strength.
///
/// `0.0` disables length normalization, `1.0` normalizes fully against the
/// average document length.
pub const BM25_B: f64 = 0.75;

// =============================================================================
// Fusion
// =============================================================================

/// RRF smoothing constant (see [`crate::search::fusion::RRF_K`]).
pub const RRF_K: f64 = crate::search::fusion::RRF_K;

/// Hybrid search pulls `top_k * HYBRID_CANDIDATE_MULTIPLIER` candidates from
/// each retrieval method before fusing.
///
/// A document ranked just below `top_k` by both methods can still win after
/// fusion, so the candidate pool must be wider than the final result list.
pub const HYBRID_CANDIDATE_MULTIPLIER: usize = 5;

// =============================================================================
// Embedding
// =============================================================================

/// Number of documents passed to [`Embedder::embed_batch`](crate::embedding::Embedder::embed_batch)
/// per call during a build.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Default vector dimension for the reference hashing embedder.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

// =============================================================================
// Persistence
// =============================================================================

/// Directory name for persisted indexes, relative to the data directory.
pub const INDEX_DIR_NAME: &str = "index";

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: BM25_K1,
            b: BM25_B,
        }
    }
}

/// Runtime configuration for a [`Retriever`](crate::search::Retriever).
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides:
///
/// ```json
/// { "bm25": { "k1": 1.2 }, "language": "zh" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub bm25: Bm25Params,
    pub rrf_k: f64,
    pub candidate_multiplier: usize,
    pub embed_batch_size: usize,
    /// Root of the persisted index (`keyword/` and `vector/` live below it)
    pub index_dir: PathBuf,
    /// Newline-separated stop words added to the standard English list
    pub custom_stopwords: Option<PathBuf>,
    pub language: Language,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            rrf_k: RRF_K,
            candidate_multiplier: HYBRID_CANDIDATE_MULTIPLIER,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            index_dir: PathBuf::from(INDEX_DIR_NAME),
            custom_stopwords: None,
            language: Language::English,
        }
    }
}

impl RetrievalConfig {
    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| SearchError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy rooted at `index_dir`.
    pub fn with_index_dir(mut self, index_dir: impl Into<PathBuf>) -> Self {
        self.index_dir = index_dir.into();
        self
    }

    /// Checks parameter ranges.
    ///
    /// Comparisons are written so that NaN fails them.
    pub fn validate(&self) -> Result<()> {
        if !(self.bm25.k1 >= 0.0) {
            return Err(SearchError::Config(format!(
                "bm25.k1 must be >= 0, got {}",
                self.bm25.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(SearchError::Config(format!(
                "bm25.b must be within [0, 1], got {}",
                self.bm25.b
            )));
        }
        if !(self.rrf_k > 0.0) {
            return Err(SearchError::Config(format!(
                "rrf_k must be > 0, got {}",
                self.rrf_k
            )));
        }
        if self.candidate_multiplier == 0 {
            return Err(SearchError::Config(
                "candidate_multiplier must be >= 1".to_string(),
            ));
        }
        if self.embed_batch_size == 0 {
            return Err(SearchError::Config(
                "embed_batch_size must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
