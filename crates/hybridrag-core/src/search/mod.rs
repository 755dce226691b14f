//! Hybrid search combining keyword and vector retrieval.
//!
//! This module implements a hybrid retrieval system that combines:
//! - **Keyword search** (exact term matching via BM25)
//! - **Vector search** (semantic similarity via exhaustive cosine scan)
//! - **Reciprocal Rank Fusion** (RRF) to merge rankings
//!
//! # Architecture
//!
//! - `types`: Core types (Document, SearchResult, SearchMethod)
//! - `keyword`: BM25 inverted index with term statistics
//! - `vector`: Flat cosine-similarity vector store
//! - `fusion`: Reciprocal Rank Fusion algorithm for merging results
//! - `retriever`: Retriever owning the atomically swapped index snapshot
//!
//! # Algorithm Details
//!
//! **Keyword Search (BM25)**:
//! - `idf = ln((N - n_t + 0.5) / (n_t + 0.5) + 1)`
//! - Term frequency saturates with `k1`, length normalization set by `b`
//!   (defaults k1=1.5, b=0.75)
//!
//! **Vector Search**:
//! - Cosine similarity against every stored vector; exact, no approximation
//!
//! **Reciprocal Rank Fusion (RRF)**:
//! - Formula: `score = Σ 1 / (k + rank)` where k=60
//! - Merges vector and keyword rankings without score normalization
//!
//! Every ranked list breaks score ties by ascending document id, so results
//! are reproducible across runs and platforms.

pub mod fusion;
pub mod keyword;
pub mod retriever;
pub mod types;
pub mod vector;

pub use fusion::{reciprocal_rank_fusion, RRF_K};
pub use keyword::KeywordIndex;
pub use retriever::{IndexSnapshot, Retriever, KEYWORD_DIR, VECTOR_DIR};
pub use types::{validate_dimension, Document, Metadata, SearchMethod, SearchResult};
pub use vector::{cosine_similarity, VectorStore};

pub use crate::error::SearchError;
