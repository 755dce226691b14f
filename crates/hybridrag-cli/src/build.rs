//! Build command implementation.
//!
//! Loads a JSON corpus, indexes it and saves the index under the data
//! directory.

use crate::search::open_engine;
use anyhow::{Context, Result};
use hybridrag_core::corpus::load_corpus;
use hybridrag_core::RetrievalConfig;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Summary of a completed build.
#[derive(Debug, Serialize)]
pub struct BuildSummary {
    pub documents: usize,
    pub dimension: usize,
    pub generation: u64,
    pub index_dir: PathBuf,
}

/// Builds and saves an index from `corpus`.
///
/// Runs on the blocking pool; indexing and embedding are CPU bound.
pub async fn execute_build(
    corpus: PathBuf,
    dimension: usize,
    config: RetrievalConfig,
) -> Result<BuildSummary> {
    tokio::task::spawn_blocking(move || -> Result<BuildSummary> {
        let documents = load_corpus(&corpus)
            .with_context(|| format!("Failed to load corpus: {}", corpus.display()))?;

        let index_dir = config.index_dir.clone();
        let engine = open_engine(config, dimension)?;
        let generation = engine.build(documents).context("Failed to build index")?;
        engine
            .save_index()
            .with_context(|| format!("Failed to save index to {}", index_dir.display()))?;

        let documents = engine.snapshot()?.len();
        info!("Indexed {} documents into {}", documents, index_dir.display());
        Ok(BuildSummary {
            documents,
            dimension,
            generation,
            index_dir,
        })
    })
    .await
    .context("Build task failed")?
}
