//! Exhaustive cosine-similarity vector store.
//!
//! Every query is compared against every stored vector, so results are exact
//! and independent of insertion order. Dot products and norms accumulate in
//! `f64`.

use super::types::{rank_scored, validate_dimension, Document, SearchResult};
use crate::error::{Result, SearchError};
use crate::storage::{
    deserialize_embeddings, serialize_embeddings, IndexDirectory, IndexManifest, StoreKind,
};
use instant::Instant;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

const DOCUMENTS: &str = "documents";
const VECTORS: &str = "vectors";

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when either vector has zero norm or the result is not
/// finite, so it is never NaN. Extra trailing components of the longer slice
/// are ignored.
///
/// # Examples
///
/// ```
/// use hybridrag_core::search::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-12);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// One row of `documents.json`, in the same order as `vectors.bin`.
#[derive(Serialize, Deserialize)]
struct VectorRecord {
    id: String,
    document: Arc<Document>,
}

/// Flat vector store with a fixed dimension.
#[derive(Debug, Clone)]
pub struct VectorStore {
    dimension: usize,
    embeddings: HashMap<String, Vec<f32>>,
    documents: HashMap<String, Arc<Document>>,
}

impl VectorStore {
    /// Creates an empty store accepting vectors of length `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            embeddings: HashMap::new(),
            documents: HashMap::new(),
        }
    }

    /// Returns the embedding dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the number of stored vectors.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Stores `vector` and `document` under `id`, replacing any previous entry.
    ///
    /// `document.id` is expected to equal `id`; [`load_index`](Self::load_index)
    /// rejects saved records where the two differ.
    ///
    /// # Errors
    ///
    /// - [`SearchError::DimensionMismatch`] if the vector length differs from
    ///   the store dimension
    /// - [`SearchError::EmbeddingFailure`] if a component is NaN or infinite
    pub fn add(
        &mut self,
        id: impl Into<String>,
        vector: Vec<f32>,
        document: impl Into<Arc<Document>>,
    ) -> Result<String> {
        validate_dimension(self.dimension, vector.len())?;
        let id = id.into();
        if let Some(position) = vector.iter().position(|value| !value.is_finite()) {
            return Err(SearchError::EmbeddingFailure {
                document_id: id,
                reason: format!(
                    "component {} of the embedding is {}",
                    position, vector[position]
                ),
            });
        }
        self.embeddings.insert(id.clone(), vector);
        self.documents.insert(id.clone(), document.into());
        Ok(id)
    }

    /// Searches for the `limit` vectors most similar to `query`.
    ///
    /// Results are ordered by cosine similarity descending, ties broken by
    /// ascending id. An empty store yields an empty list.
    ///
    /// # Errors
    ///
    /// [`SearchError::DimensionMismatch`] if the query length differs from the
    /// store dimension.
    #[instrument(skip_all, fields(limit = limit))]
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        validate_dimension(self.dimension, query.len())?;

        let scored = self
            .embeddings
            .iter()
            .filter_map(|(id, embedding)| {
                self.documents
                    .get(id)
                    .map(|document| (Arc::clone(document), cosine_similarity(query, embedding)))
            })
            .collect();
        Ok(rank_scored(scored, limit))
    }

    pub fn retrieve_by_id(&self, id: &str) -> Result<Arc<Document>> {
        self.documents
            .get(id)
            .cloned()
            .ok_or_else(|| SearchError::NotFound(id.to_string()))
    }

    pub fn embedding(&self, id: &str) -> Option<&[f32]> {
        self.embeddings.get(id).map(Vec::as_slice)
    }

    /// Swaps each stored document for the one `lookup` returns when the two
    /// are equal, so stores loaded from disk share allocations.
    pub(crate) fn share_documents<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<Arc<Document>>,
    {
        for (id, document) in self.documents.iter_mut() {
            if let Some(shared) = lookup(id) {
                if shared == *document {
                    *document = shared;
                }
            }
        }
    }

    /// Ids of all stored vectors, sorted.
    pub fn document_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.embeddings.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Writes `documents.json`, `vectors.bin` and the manifest into `dir`.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn save_index(&self, dir: &Path) -> Result<()> {
        let start = Instant::now();
        let store = IndexDirectory::with_path(dir);
        store.begin_write()?;

        let ids = self.document_ids();
        let mut records = Vec::with_capacity(ids.len());
        let mut vectors = Vec::with_capacity(ids.len());
        for id in ids {
            let (Some(document), Some(embedding)) = (self.documents.get(id), self.embeddings.get(id))
            else {
                continue;
            };
            records.push(VectorRecord {
                id: id.to_string(),
                document: Arc::clone(document),
            });
            vectors.push(embedding.as_slice());
        }

        let bytes = serialize_embeddings(vectors.iter().copied());
        let entries = vec![
            store.write_json_table(DOCUMENTS, "documents.json", &records, records.len())?,
            store.write_table(VECTORS, "vectors.bin", &bytes, vectors.len())?,
        ];
        let manifest =
            IndexManifest::new(StoreKind::Vector, records.len(), entries).with_dimension(self.dimension);
        store.commit(&manifest)?;

        info!(
            "Saved vector store: {} vectors (dim {}) in {:.2}ms",
            records.len(),
            self.dimension,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Replaces the store contents with the index stored in `dir`.
    ///
    /// Nothing changes unless the whole index loads and validates.
    ///
    /// # Errors
    ///
    /// - [`SearchError::DimensionMismatch`] if the stored dimension differs
    ///   from this store's dimension
    /// - [`SearchError::IndexCorrupt`] for missing, damaged or inconsistent files
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load_index(&mut self, dir: &Path) -> Result<()> {
        let start = Instant::now();
        let store = IndexDirectory::with_path(dir);
        let manifest = store.read_manifest(StoreKind::Vector)?;

        let dimension = manifest
            .embedding_dimension
            .ok_or_else(|| store.corrupt("manifest has no embedding dimension"))?;
        validate_dimension(self.dimension, dimension)?;

        let records: Vec<VectorRecord> = store.read_json_table(&manifest, DOCUMENTS, Vec::len)?;
        let (bytes, entry) = store.read_table(&manifest, VECTORS)?;
        store.check_entries(entry, records.len())?;
        if records.len() != manifest.document_count {
            return Err(store.corrupt(format!(
                "manifest records {} documents, found {}",
                manifest.document_count,
                records.len()
            )));
        }

        let expected_bytes = records.len() * dimension * 4;
        if bytes.len() != expected_bytes {
            return Err(store.corrupt(format!(
                "vectors.bin holds {} bytes, expected {} ({} vectors x {} dims)",
                bytes.len(),
                expected_bytes,
                records.len(),
                dimension
            )));
        }

        let values = deserialize_embeddings(&bytes);
        let mut embeddings = HashMap::with_capacity(records.len());
        let mut documents = HashMap::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            if record.document.id != record.id {
                return Err(store.corrupt(format!(
                    "document stored under {:?} has id {:?}",
                    record.id, record.document.id
                )));
            }
            let row = values[i * dimension..(i + 1) * dimension].to_vec();
            if embeddings.insert(record.id.clone(), row).is_some() {
                return Err(store.corrupt(format!("duplicate vector id {:?}", record.id)));
            }
            documents.insert(record.id, record.document);
        }
        info!(
            "Loaded vector store: {} vectors (dim {}) in {:.2}ms",
            documents.len(),
            dimension,
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.embeddings = embeddings;
        self.documents = documents;
        Ok(())
    }
}
