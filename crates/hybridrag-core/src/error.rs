//! Error types for hybridrag-core.
//!
//! [`SearchError`] is returned by every index, store and retriever operation.
//! [`EmbeddingError`] is the error type of the [`Embedder`](crate::embedding::Embedder)
//! collaborator; the retriever wraps it into [`SearchError::EmbeddingFailure`]
//! together with the document that could not be embedded.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during embedding operations.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Failed to load or initialize the model
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    /// Inference on the given input failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Model not available or initialization failed
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Errors that can occur while building, querying or persisting an index.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// A term lookup expected exactly one token after tokenization
    #[error("Term {term:?} must produce exactly one token, got {token_count}")]
    InvalidTerm { term: String, token_count: usize },

    /// No document with the given id
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Search or lookup before a successful build or load
    #[error("Index has not been built")]
    UnbuiltIndex,

    /// Search method string outside keyword/semantic/hybrid
    #[error("Unsupported search method: {0:?} (expected keyword, semantic or hybrid)")]
    UnsupportedMethod(String),

    /// Persisted index files are missing, mismatched or unreadable
    #[error("Corrupt index at {}: {reason}", path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    /// The embedder failed while building the vector store
    #[error("Embedding failed for document {document_id:?}: {reason}")]
    EmbeddingFailure { document_id: String, reason: String },

    /// The embedder failed on a query
    #[error("Failed to embed query: {0}")]
    QueryEmbedding(String),

    /// Vector length differs from the store dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid retrieval configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SearchError {
    /// Shorthand for an [`SearchError::IndexCorrupt`] at `path`.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SearchError::IndexCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

// Conversion implementations for error chaining

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}

impl From<String> for EmbeddingError {
    fn from(s: String) -> Self {
        EmbeddingError::InferenceFailed(s)
    }
}
