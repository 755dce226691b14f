//! Hybrid retriever combining semantic (cosine) and keyword (BM25) search.
//!
//! The [`Retriever`] owns the current [`IndexSnapshot`], an immutable pair of
//! keyword index and vector store built from the same corpus. Searches clone
//! the snapshot's `Arc` and run without holding any lock; a rebuild
//! constructs the next snapshot off to the side and swaps the pointer only
//! once it is complete. A search therefore always sees one corpus version,
//! and a failed build leaves the previous snapshot serving.
//!
//! # Example
//!
//! ```
//! use hybridrag_core::config::RetrievalConfig;
//! use hybridrag_core::embedding::HashingEmbedder;
//! use hybridrag_core::search::{Document, Retriever, SearchMethod};
//! use hybridrag_core::tokenization::WordTokenizer;
//! use std::sync::Arc;
//!
//! let retriever = Retriever::new(
//!     HashingEmbedder::new(64),
//!     Arc::new(WordTokenizer::default()),
//!     RetrievalConfig::default(),
//! );
//! retriever.build(vec![
//!     Document::new("1", "Rust is a systems programming language"),
//!     Document::new("2", "Bread is baked in an oven"),
//! ])?;
//!
//! let results = retriever.search("programming in rust", 1, SearchMethod::Hybrid)?;
//! assert_eq!(results[0].document.id, "1");
//! # Ok::<(), hybridrag_core::error::SearchError>(())
//! ```

use super::fusion::reciprocal_rank_fusion;
use super::keyword::KeywordIndex;
use super::types::{Document, SearchMethod, SearchResult};
use super::vector::VectorStore;
use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::{Result, SearchError};
use crate::storage::IndexDirectory;
use crate::tokenization::Tokenizer;
use instant::Instant;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

/// Subdirectory of the index directory holding the keyword index.
pub const KEYWORD_DIR: &str = "keyword";
/// Subdirectory of the index directory holding the vector store.
pub const VECTOR_DIR: &str = "vector";

/// One immutable, internally consistent version of both indexes.
pub struct IndexSnapshot<T: Tokenizer> {
    generation: u64,
    keyword: KeywordIndex<T>,
    vector: VectorStore,
}

impl<T: Tokenizer> IndexSnapshot<T> {
    /// Monotonically increasing version number, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn keyword(&self) -> &KeywordIndex<T> {
        &self.keyword
    }

    pub fn vector(&self) -> &VectorStore {
        &self.vector
    }

    /// Number of documents in the snapshot.
    pub fn len(&self) -> usize {
        self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty()
    }

    pub fn retrieve_by_id(&self, id: &str) -> Result<Arc<Document>> {
        self.keyword.retrieve_by_id(id)
    }
}

/// Hybrid retriever over a fixed corpus.
///
/// Generic over the [`Embedder`] used for documents and queries and the
/// [`Tokenizer`] used by the keyword index. Share it across threads with an
/// `Arc<Retriever<..>>`; every method takes `&self`.
pub struct Retriever<E: Embedder, T: Tokenizer> {
    embedder: E,
    tokenizer: Arc<T>,
    config: RetrievalConfig,
    current: RwLock<Option<Arc<IndexSnapshot<T>>>>,
}

impl<E: Embedder, T: Tokenizer> Retriever<E, T> {
    /// Creates a retriever with no index. Every search fails with
    /// [`SearchError::UnbuiltIndex`] until [`build`](Self::build) or
    /// [`load_index`](Self::load_index) succeeds.
    pub fn new(embedder: E, tokenizer: Arc<T>, config: RetrievalConfig) -> Self {
        Self {
            embedder,
            tokenizer,
            config,
            current: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Returns the snapshot currently serving searches.
    pub fn snapshot(&self) -> Result<Arc<IndexSnapshot<T>>> {
        // The lock only guards a pointer swap, so a poisoned lock still holds
        // a valid snapshot.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SearchError::UnbuiltIndex)
    }

    /// Generation of the serving snapshot, `None` before the first build.
    pub fn generation(&self) -> Option<u64> {
        self.snapshot().ok().map(|snapshot| snapshot.generation)
    }

    pub fn is_built(&self) -> bool {
        self.snapshot().is_ok()
    }

    /// Number of candidates pulled from each method by a hybrid search.
    pub fn hybrid_candidate_count(&self, top_k: usize) -> usize {
        top_k.saturating_mul(self.config.candidate_multiplier)
    }

    /// Builds both indexes from `documents` and publishes them together.
    ///
    /// The keyword index is built on a scoped thread while documents are
    /// embedded in batches of `config.embed_batch_size`. Returns the
    /// generation of the published snapshot.
    ///
    /// # Errors
    ///
    /// [`SearchError::EmbeddingFailure`] if the embedder fails, returns the
    /// wrong number of vectors or a vector of the wrong dimension. The
    /// previously published snapshot, if any, keeps serving.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn build(&self, documents: Vec<Document>) -> Result<u64> {
        let start = Instant::now();
        let documents: Vec<Arc<Document>> = documents.into_iter().map(Arc::new).collect();

        let (keyword, vector) = std::thread::scope(|s| {
            let keyword_handle = s.spawn(|| {
                let mut keyword =
                    KeywordIndex::new(Arc::clone(&self.tokenizer), self.config.bm25);
                keyword.build_index(documents.iter().cloned());
                keyword
            });

            let vector = self.embed_documents(&documents);
            let keyword = keyword_handle
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (keyword, vector)
        });

        let vector = match vector {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Build aborted, keeping previous index: {}", e);
                return Err(e);
            }
        };

        let document_count = keyword.len();
        let generation = self.publish(keyword, vector);
        info!(
            "Built index generation {}: {} documents in {:.2}ms",
            generation,
            document_count,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(generation)
    }

    fn embed_documents(&self, documents: &[Arc<Document>]) -> Result<VectorStore> {
        let start = Instant::now();
        let mut store = VectorStore::new(self.embedder.embedding_dim());

        for batch in documents.chunks(self.config.embed_batch_size.max(1)) {
            let first_id = || batch.first().map(|d| d.id.clone()).unwrap_or_default();
            let texts: Vec<&str> = batch.iter().map(|d| d.content.as_str()).collect();

            let embeddings =
                self.embedder
                    .embed_batch(&texts)
                    .map_err(|e| SearchError::EmbeddingFailure {
                        document_id: first_id(),
                        reason: format!("batch of {} documents failed: {}", batch.len(), e),
                    })?;
            if embeddings.len() != batch.len() {
                return Err(SearchError::EmbeddingFailure {
                    document_id: first_id(),
                    reason: format!(
                        "embedder returned {} vectors for {} documents",
                        embeddings.len(),
                        batch.len()
                    ),
                });
            }

            for (document, embedding) in batch.iter().zip(embeddings) {
                store
                    .add(document.id.clone(), embedding, Arc::clone(document))
                    .map_err(|e| SearchError::EmbeddingFailure {
                        document_id: document.id.clone(),
                        reason: e.to_string(),
                    })?;
            }
        }

        debug!(
            "Embedded {} documents in {:.2}ms",
            documents.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(store)
    }

    /// Swaps in a new snapshot and returns its generation.
    fn publish(&self, keyword: KeywordIndex<T>, vector: VectorStore) -> u64 {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let generation = current.as_ref().map_or(0, |snapshot| snapshot.generation) + 1;
        *current = Some(Arc::new(IndexSnapshot {
            generation,
            keyword,
            vector,
        }));
        generation
    }

    /// Cosine-similarity search over document embeddings.
    #[instrument(skip_all, fields(top_k = top_k))]
    pub fn semantic_search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let snapshot = self.snapshot()?;
        self.semantic_on(&snapshot, query, top_k)
    }

    /// BM25 search over the keyword index.
    #[instrument(skip_all, fields(top_k = top_k))]
    pub fn keyword_search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.keyword.search(query, top_k))
    }

    /// Reciprocal rank fusion of semantic and keyword results.
    ///
    /// Each method contributes [`hybrid_candidate_count`](Self::hybrid_candidate_count)
    /// candidates; the fused list is truncated to `top_k`. Both methods run
    /// against the same snapshot.
    #[instrument(skip_all, fields(top_k = top_k))]
    pub fn hybrid_search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let snapshot = self.snapshot()?;
        let candidates = self.hybrid_candidate_count(top_k);

        let semantic = self.semantic_on(&snapshot, query, candidates)?;
        let keyword = snapshot.keyword.search(query, candidates);
        let mut fused = reciprocal_rank_fusion(&semantic, &keyword, self.config.rrf_k);
        fused.truncate(top_k);

        debug!(
            "Hybrid search: {} semantic + {} keyword candidates -> {} results",
            semantic.len(),
            keyword.len(),
            fused.len()
        );
        Ok(fused)
    }

    fn semantic_on(
        &self,
        snapshot: &IndexSnapshot<T>,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let embedding = self
            .embedder
            .embed(query)
            .map_err(|e| SearchError::QueryEmbedding(e.to_string()))?;
        snapshot.vector.search(&embedding, top_k)
    }

    /// Runs the search selected by `method`.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        method: SearchMethod,
    ) -> Result<Vec<SearchResult>> {
        match method {
            SearchMethod::Keyword => self.keyword_search(query, top_k),
            SearchMethod::Semantic => self.semantic_search(query, top_k),
            SearchMethod::Hybrid => self.hybrid_search(query, top_k),
        }
    }

    /// Like [`search`](Self::search), with the method given by name.
    ///
    /// # Errors
    ///
    /// [`SearchError::UnsupportedMethod`] unless `method` is `keyword`,
    /// `semantic` or `hybrid`.
    pub fn search_with(&self, query: &str, top_k: usize, method: &str) -> Result<Vec<SearchResult>> {
        self.search(query, top_k, method.parse()?)
    }

    pub fn retrieve_by_id(&self, id: &str) -> Result<Arc<Document>> {
        self.snapshot()?.retrieve_by_id(id)
    }

    /// Persists the serving snapshot under `config.index_dir`.
    pub fn save_index(&self) -> Result<()> {
        self.save_index_to(&self.config.index_dir)
    }

    /// Persists the serving snapshot under `dir`.
    ///
    /// Both manifests are removed before either store is written, so a save
    /// that stops part way leaves an index that fails to load instead of one
    /// pairing the new keyword tables with the old vectors.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn save_index_to(&self, dir: &Path) -> Result<()> {
        let snapshot = self.snapshot()?;
        let keyword_dir = dir.join(KEYWORD_DIR);
        let vector_dir = dir.join(VECTOR_DIR);
        IndexDirectory::with_path(&keyword_dir).begin_write()?;
        IndexDirectory::with_path(&vector_dir).begin_write()?;

        snapshot.keyword.save_index(&keyword_dir)?;
        snapshot.vector.save_index(&vector_dir)?;
        info!(
            "Saved index generation {} ({} documents) to {}",
            snapshot.generation,
            snapshot.len(),
            dir.display()
        );
        Ok(())
    }

    /// Loads a persisted index from `config.index_dir` and publishes it.
    pub fn load_index(&self) -> Result<u64> {
        self.load_index_from(&self.config.index_dir)
    }

    /// Loads a persisted index from `dir` and publishes it.
    ///
    /// # Errors
    ///
    /// [`SearchError::IndexCorrupt`] if either store is missing or damaged, or
    /// the two stores hold different documents (different ids, or the same
    /// id with different content). The serving snapshot is unchanged on
    /// error.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load_index_from(&self, dir: &Path) -> Result<u64> {
        let start = Instant::now();

        let mut keyword = KeywordIndex::new(Arc::clone(&self.tokenizer), self.config.bm25);
        keyword.load_index(&dir.join(KEYWORD_DIR))?;
        let mut vector = VectorStore::new(self.embedder.embedding_dim());
        vector.load_index(&dir.join(VECTOR_DIR))?;

        if keyword.document_ids() != vector.document_ids() {
            return Err(SearchError::corrupt(
                dir,
                format!(
                    "keyword index holds {} documents, vector store {}, and their ids differ",
                    keyword.len(),
                    vector.len()
                ),
            ));
        }
        for id in keyword.document_ids() {
            let same = match (keyword.retrieve_by_id(id), vector.retrieve_by_id(id)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
            if !same {
                return Err(SearchError::corrupt(
                    dir,
                    format!(
                        "keyword and vector stores disagree on document {:?}; they were saved by different builds",
                        id
                    ),
                ));
            }
        }
        vector.share_documents(|id| keyword.retrieve_by_id(id).ok());

        let document_count = keyword.len();
        let generation = self.publish(keyword, vector);
        info!(
            "Loaded index generation {}: {} documents in {:.2}ms",
            generation,
            document_count,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(generation)
    }
}
