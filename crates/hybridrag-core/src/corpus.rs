//! Document feed loading.
//!
//! A corpus file is a JSON array of documents:
//!
//! ```json
//! [
//!   { "id": "faq-1", "content": "How do I reset my password?", "metadata": { "source": "faq" } },
//!   { "id": "faq-2", "content": "Where can I download invoices?" }
//! ]
//! ```

use crate::error::{Result, SearchError};
use crate::search::Document;
use std::path::Path;
use tracing::{debug, info};

/// Reads a corpus file, skipping documents whose content is blank.
pub fn load_corpus(path: &Path) -> Result<Vec<Document>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SearchError::Io(format!("{}: {}", path.display(), e)))?;
    let documents = parse_corpus(&raw).map_err(|e| match e {
        SearchError::Serialization(msg) => {
            SearchError::Serialization(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    info!("Loaded {} documents from {}", documents.len(), path.display());
    Ok(documents)
}

/// Parses a JSON corpus, skipping documents whose content is blank.
pub fn parse_corpus(json: &str) -> Result<Vec<Document>> {
    let documents: Vec<Document> = serde_json::from_str(json)?;
    let total = documents.len();
    let documents: Vec<Document> = documents
        .into_iter()
        .filter(|document| {
            let keep = !document.content.trim().is_empty();
            if !keep {
                debug!("Skipping document {:?} with empty content", document.id);
            }
            keep
        })
        .collect();

    if documents.len() < total {
        debug!("Skipped {} empty documents", total - documents.len());
    }
    Ok(documents)
}
