//! Search and show command implementations.
//!
//! Handles constructing the retriever and executing queries against an
//! existing index.

use crate::config;
use anyhow::{Context, Result};
use hybridrag_core::embedding::HashingEmbedder;
use hybridrag_core::tokenization::LanguageTokenizer;
use hybridrag_core::{Document, Retriever, RetrievalConfig, SearchResult};
use std::sync::Arc;
use tracing::info;

/// Retriever type used by every command.
pub type Engine = Retriever<HashingEmbedder, LanguageTokenizer>;

/// Creates an empty retriever for `config`.
///
/// The embedder tokenizes with the same language pipeline as the keyword
/// index.
pub fn open_engine(config: RetrievalConfig, dimension: usize) -> Result<Engine> {
    let tokenizer = Arc::new(
        LanguageTokenizer::from_config(&config).context("Failed to create tokenizer")?,
    );
    let embedder = HashingEmbedder::with_tokenizer(dimension, tokenizer.clone());
    Ok(Retriever::new(embedder, tokenizer, config))
}

/// Opens the retriever and loads the saved index.
fn load_engine(config: RetrievalConfig) -> Result<Engine> {
    let dimension = config::stored_dimension(&config.index_dir)?;
    info!(
        "Loading index from {} (embedding dim: {})",
        config.index_dir.display(),
        dimension
    );

    let engine = open_engine(config, dimension)?;
    engine.load_index().context("Failed to load index")?;
    Ok(engine)
}

/// Performs a search against the existing index.
///
/// This function:
/// 1. Reads the embedding dimension from the saved vector store
/// 2. Loads both indexes into a fresh retriever
/// 3. Runs the search selected by `method`
///
/// `method` is parsed by the retriever, so an unknown name surfaces as an
/// unsupported-method error.
pub async fn execute_search(
    query: String,
    limit: usize,
    method: String,
    config: RetrievalConfig,
) -> Result<Vec<SearchResult>> {
    tokio::task::spawn_blocking(move || -> Result<Vec<SearchResult>> {
        let engine = load_engine(config)?;

        info!("Searching for: \"{}\" ({})", query, method);
        let results = engine
            .search_with(&query, limit, &method)
            .context("Search failed")?;

        info!("Found {} results", results.len());
        Ok(results)
    })
    .await
    .context("Search task failed")?
}

/// Looks up a single document by id.
pub async fn execute_show(id: String, config: RetrievalConfig) -> Result<Arc<Document>> {
    tokio::task::spawn_blocking(move || -> Result<Arc<Document>> {
        let engine = load_engine(config)?;
        engine
            .retrieve_by_id(&id)
            .with_context(|| format!("Failed to show document {:?}", id))
    })
    .await
    .context("Show task failed")?
}
