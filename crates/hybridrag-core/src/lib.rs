//! # hybridrag-core
//!
//! Hybrid retrieval engine: answers natural-language queries over a fixed
//! document corpus by combining BM25 keyword search with cosine-similarity
//! vector search through reciprocal rank fusion.
//!
//! ## Modules
//!
//! - [`search`] - Keyword index, vector store, RRF fusion and the retriever
//! - [`tokenization`] - Tokenizers, stop words, stemming, segmentation
//! - [`embedding`] - Embedder trait and the hashing reference embedder
//! - [`storage`] - Versioned, checksummed on-disk index format
//! - [`corpus`] - JSON document feed loader
//! - [`config`] - Defaults and runtime configuration
//! - [`error`] - Error types

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod search;
pub mod storage;
pub mod tokenization;

pub use config::RetrievalConfig;
pub use error::{EmbeddingError, Result, SearchError};
pub use search::{Document, Retriever, SearchMethod, SearchResult};
