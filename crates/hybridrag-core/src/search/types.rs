use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Free-form document metadata (source URL, title, timestamps, ...).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A corpus document.
///
/// Documents are immutable once indexed. Indexes hold them as
/// `Arc<Document>`, so every result list shares the indexed copy.
///
/// # Examples
///
/// ```
/// use hybridrag_core::search::Document;
///
/// let doc = Document::new("faq-1", "How do I reset my password?");
/// assert!(doc.metadata.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within a corpus
    pub id: String,
    /// Text indexed by both retrieval methods
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A ranked search hit.
///
/// Within one result list ranks run `1, 2, 3, ...` and scores never increase
/// with rank. Scores are only comparable within the list that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub document: Arc<Document>,
    pub score: f64,
    /// 1-based position in the result list
    pub rank: usize,
}

/// Retrieval method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    /// BM25 over the inverted index
    Keyword,
    /// Cosine similarity over document embeddings
    Semantic,
    /// Reciprocal rank fusion of keyword and semantic results
    Hybrid,
}

impl SearchMethod {
    pub const ALL: [SearchMethod; 3] = [
        SearchMethod::Keyword,
        SearchMethod::Semantic,
        SearchMethod::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Keyword => "keyword",
            SearchMethod::Semantic => "semantic",
            SearchMethod::Hybrid => "hybrid",
        }
    }
}

impl FromStr for SearchMethod {
    type Err = SearchError;

    /// Parses `keyword`, `semantic` or `hybrid` (case-insensitive).
    ///
    /// Any other string is [`SearchError::UnsupportedMethod`]; there is no
    /// fallback method.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        SearchMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == normalized)
            .ok_or_else(|| SearchError::UnsupportedMethod(s.to_string()))
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates that an embedding has the expected dimension.
///
/// Returns `Ok(())` if dimensions match, or `Err(SearchError::DimensionMismatch)` otherwise.
///
/// # Examples
///
/// ```
/// use hybridrag_core::search::validate_dimension;
///
/// let embedding = vec![1.0, 2.0, 3.0];
/// assert!(validate_dimension(3, embedding.len()).is_ok());
/// assert!(validate_dimension(5, embedding.len()).is_err());
/// ```
pub fn validate_dimension(expected: usize, actual: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(SearchError::DimensionMismatch { expected, actual })
    }
}

/// Orders scored documents by score descending then id ascending, keeps the
/// first `limit` and assigns ranks from 1.
pub(crate) fn rank_scored(mut scored: Vec<(Arc<Document>, f64)>, limit: usize) -> Vec<SearchResult> {
    scored.sort_by(|(doc_a, score_a), (doc_b, score_b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| doc_a.id.cmp(&doc_b.id))
    });
    scored.truncate(limit);
    scored
        .into_iter()
        .enumerate()
        .map(|(i, (document, score))| SearchResult {
            document,
            score,
            rank: i + 1,
        })
        .collect()
}
