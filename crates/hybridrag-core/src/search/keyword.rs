//! BM25 keyword search for exact term matching.
//!
//! [`KeywordIndex`] keeps an inverted index over tokenized documents and ranks
//! them with Okapi BM25. BM25 (Best Matching 25) is a ranking function used by
//! search engines to score documents based on query term frequency.
//!
//! # Algorithm
//!
//! For each unique query term `t` present in the index:
//!
//! ```text
//! idf(t)       = ln((N - n_t + 0.5) / (n_t + 0.5) + 1)
//! tf_norm(d,t) = f(t,d) * (k1 + 1) / (f(t,d) + k1 * (1 - b + b * |d| / avgdl))
//! score(d)     = Σ idf(t) * tf_norm(d,t)
//! ```
//!
//! where `N` is the document count, `n_t` the number of documents containing
//! `t`, `f(t,d)` the count of `t` in `d`, `|d|` the token length of `d` and
//! `avgdl` the mean token length. Documents sharing no term with the query are
//! never scored.
//!
//! # Usage
//!
//! ```
//! use hybridrag_core::config::Bm25Params;
//! use hybridrag_core::search::{Document, KeywordIndex};
//! use hybridrag_core::tokenization::WordTokenizer;
//! use std::sync::Arc;
//!
//! let mut index = KeywordIndex::new(Arc::new(WordTokenizer::default()), Bm25Params::default());
//! index.build_index(vec![
//!     Document::new("1", "rust programming language"),
//!     Document::new("2", "python scripting language"),
//! ]);
//!
//! let results = index.search("rust", 10);
//! assert_eq!(results[0].document.id, "1");
//! ```

use super::types::{rank_scored, Document, SearchResult};
use crate::config::Bm25Params;
use crate::error::{Result, SearchError};
use crate::storage::{IndexDirectory, IndexManifest, StoreKind};
use crate::tokenization::{single_token, Tokenizer};
use instant::Instant;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const POSTINGS: &str = "postings";
const TERM_FREQUENCIES: &str = "term_frequencies";
const DOC_LENGTHS: &str = "doc_lengths";
const DOCUMENTS: &str = "documents";

/// The four index tables. Always built, loaded and replaced as one unit.
#[derive(Debug, Default)]
struct KeywordTables {
    /// token -> ids of documents containing it
    postings: HashMap<String, BTreeSet<String>>,
    /// doc id -> token -> count
    term_frequencies: HashMap<String, HashMap<String, u32>>,
    /// doc id -> token count
    doc_lengths: HashMap<String, usize>,
    documents: HashMap<String, Arc<Document>>,
    /// Sum of all document lengths
    total_length: usize,
}

impl KeywordTables {
    fn insert(&mut self, tokens: Vec<String>, document: Arc<Document>) {
        let id = document.id.clone();

        // A repeated id replaces the earlier document in every table.
        if let Some(previous) = self.term_frequencies.remove(&id) {
            for token in previous.keys() {
                if let Some(ids) = self.postings.get_mut(token) {
                    ids.remove(&id);
                    if ids.is_empty() {
                        self.postings.remove(token);
                    }
                }
            }
        }
        if let Some(previous_length) = self.doc_lengths.remove(&id) {
            self.total_length -= previous_length;
        }

        let mut frequencies: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *frequencies.entry(token.clone()).or_insert(0) += 1;
        }
        for token in frequencies.keys() {
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(id.clone());
        }

        self.total_length += tokens.len();
        self.doc_lengths.insert(id.clone(), tokens.len());
        self.term_frequencies.insert(id.clone(), frequencies);
        self.documents.insert(id, document);
    }

    /// Checks the cross-table invariants of freshly loaded tables.
    fn validate(&self, dir: &IndexDirectory) -> Result<()> {
        for (id, document) in &self.documents {
            if document.id != *id {
                return Err(dir.corrupt(format!(
                    "document stored under {id:?} has id {:?}",
                    document.id
                )));
            }
            let Some(frequencies) = self.term_frequencies.get(id) else {
                return Err(dir.corrupt(format!("document {id:?} has no term frequencies")));
            };
            let Some(&length) = self.doc_lengths.get(id) else {
                return Err(dir.corrupt(format!("document {id:?} has no length")));
            };
            let counted: u64 = frequencies.values().map(|&count| u64::from(count)).sum();
            if counted != length as u64 {
                return Err(dir.corrupt(format!(
                    "document {id:?} has length {length} but {counted} counted tokens"
                )));
            }
            for (token, &count) in frequencies {
                let posted = self
                    .postings
                    .get(token)
                    .is_some_and(|ids| ids.contains(id));
                if count == 0 || !posted {
                    return Err(dir.corrupt(format!(
                        "term {token:?} of document {id:?} is not in the postings"
                    )));
                }
            }
        }

        if self.term_frequencies.len() != self.documents.len()
            || self.doc_lengths.len() != self.documents.len()
        {
            return Err(dir.corrupt("term frequency or length tables reference unknown documents"));
        }

        for (token, ids) in &self.postings {
            for id in ids {
                let counted = self
                    .term_frequencies
                    .get(id)
                    .and_then(|frequencies| frequencies.get(token))
                    .is_some();
                if !counted {
                    return Err(dir.corrupt(format!(
                        "posting for {token:?} references {id:?} without a term frequency"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// BM25 keyword index over a fixed document set.
///
/// Generic over the [`Tokenizer`], so language handling is decided once at
/// construction. Documents and queries always pass through the same
/// tokenizer.
///
/// # Thread Safety
///
/// Searches take `&self` and never mutate; [`build_index`](Self::build_index)
/// and [`load_index`](Self::load_index) take `&mut self`. Concurrent readers
/// during a rebuild are served by swapping whole indexes (see
/// [`Retriever`](super::Retriever)).
pub struct KeywordIndex<T: Tokenizer> {
    tokenizer: Arc<T>,
    params: Bm25Params,
    tables: KeywordTables,
}

impl<T: Tokenizer> KeywordIndex<T> {
    /// Creates an empty index.
    pub fn new(tokenizer: Arc<T>, params: Bm25Params) -> Self {
        Self {
            tokenizer,
            params,
            tables: KeywordTables::default(),
        }
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Replaces the index contents with `documents`.
    ///
    /// All tables are constructed from scratch and assigned together; the
    /// previous contents are dropped. When two documents share an id the
    /// later one wins.
    #[instrument(skip_all)]
    pub fn build_index<I>(&mut self, documents: I)
    where
        I: IntoIterator,
        I::Item: Into<Arc<Document>>,
    {
        let start = Instant::now();
        let mut tables = KeywordTables::default();
        for document in documents {
            let document: Arc<Document> = document.into();
            let tokens = self.tokenizer.tokenize(&document.content);
            tables.insert(tokens, document);
        }

        debug!(
            "Built keyword index: {} documents, {} terms in {:.2}ms",
            tables.documents.len(),
            tables.postings.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.tables = tables;
    }

    /// Searches for documents matching the query.
    ///
    /// Returns up to `limit` documents ranked by BM25 score, ties broken by
    /// ascending document id. Query terms are deduplicated; terms that no
    /// document contains contribute nothing. Returns an empty vector for an
    /// empty index or when nothing matches.
    #[instrument(skip_all, fields(query_len = query.len(), limit = limit))]
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        if self.tables.documents.is_empty() || limit == 0 {
            return Vec::new();
        }

        // Sorted so score accumulation order is fixed.
        let query_tokens: BTreeSet<String> = self.tokenizer.tokenize(query).into_iter().collect();

        let mut scores: HashMap<&str, f64> = HashMap::new();
        for token in &query_tokens {
            let Some(ids) = self.tables.postings.get(token) else {
                continue;
            };
            let idf = self.bm25_idf_for(ids.len());
            for id in ids {
                *scores.entry(id.as_str()).or_insert(0.0) += idf * self.bm25_tf_for(id, token);
            }
        }

        let scored = scores
            .into_iter()
            .filter_map(|(id, score)| {
                self.tables
                    .documents
                    .get(id)
                    .map(|document| (Arc::clone(document), score))
            })
            .collect();
        rank_scored(scored, limit)
    }

    /// Looks up an indexed document.
    pub fn retrieve_by_id(&self, id: &str) -> Result<Arc<Document>> {
        self.tables
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| SearchError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tables.documents.contains_key(id)
    }

    /// Ids of all indexed documents, sorted.
    pub fn document_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tables.documents.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of indexed documents.
    pub fn len(&self) -> usize {
        self.tables.documents.len()
    }

    /// Returns `true` if no documents have been indexed.
    pub fn is_empty(&self) -> bool {
        self.tables.documents.is_empty()
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.tables.postings.len()
    }

    /// Mean document length in tokens; `0.0` for an empty index.
    pub fn avg_doc_length(&self) -> f64 {
        if self.tables.documents.is_empty() {
            0.0
        } else {
            self.tables.total_length as f64 / self.tables.documents.len() as f64
        }
    }

    pub fn doc_length(&self, id: &str) -> Option<usize> {
        self.tables.doc_lengths.get(id).copied()
    }

    // ------------------------------------------------------------------------
    // Term statistics
    //
    // Each accessor takes a single term, runs it through the tokenizer and
    // fails with `InvalidTerm` unless it yields exactly one token.
    // ------------------------------------------------------------------------

    /// Sorted ids of the documents containing `term`.
    pub fn documents_for(&self, term: &str) -> Result<Vec<String>> {
        let token = single_token(self.tokenizer.as_ref(), term)?;
        Ok(self
            .tables
            .postings
            .get(&token)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Occurrences of `term` in document `doc_id`; `0` for unknown documents.
    pub fn term_frequency(&self, doc_id: &str, term: &str) -> Result<u32> {
        let token = single_token(self.tokenizer.as_ref(), term)?;
        Ok(self.frequency(doc_id, &token))
    }

    /// Classic smoothed IDF: `ln((N + 1) / (n_t + 1))`.
    pub fn idf(&self, term: &str) -> Result<f64> {
        let token = single_token(self.tokenizer.as_ref(), term)?;
        let n = self.tables.documents.len() as f64;
        let n_t = self.document_frequency(&token) as f64;
        Ok(((n + 1.0) / (n_t + 1.0)).ln())
    }

    /// `term_frequency * idf`.
    pub fn tf_idf(&self, doc_id: &str, term: &str) -> Result<f64> {
        Ok(f64::from(self.term_frequency(doc_id, term)?) * self.idf(term)?)
    }

    /// BM25 saturated term frequency of `term` in `doc_id`.
    pub fn bm25_tf(&self, doc_id: &str, term: &str) -> Result<f64> {
        let token = single_token(self.tokenizer.as_ref(), term)?;
        Ok(self.bm25_tf_for(doc_id, &token))
    }

    /// BM25 inverse document frequency of `term`.
    pub fn bm25_idf(&self, term: &str) -> Result<f64> {
        let token = single_token(self.tokenizer.as_ref(), term)?;
        Ok(self.bm25_idf_for(self.document_frequency(&token)))
    }

    /// BM25 contribution of a single term to `doc_id`'s score.
    pub fn bm25(&self, doc_id: &str, term: &str) -> Result<f64> {
        let token = single_token(self.tokenizer.as_ref(), term)?;
        Ok(self.bm25_idf_for(self.document_frequency(&token)) * self.bm25_tf_for(doc_id, &token))
    }

    fn frequency(&self, doc_id: &str, token: &str) -> u32 {
        self.tables
            .term_frequencies
            .get(doc_id)
            .and_then(|frequencies| frequencies.get(token))
            .copied()
            .unwrap_or(0)
    }

    fn document_frequency(&self, token: &str) -> usize {
        self.tables.postings.get(token).map_or(0, BTreeSet::len)
    }

    fn bm25_idf_for(&self, document_frequency: usize) -> f64 {
        let n = self.tables.documents.len() as f64;
        let n_t = document_frequency as f64;
        ((n - n_t + 0.5) / (n_t + 0.5) + 1.0).ln()
    }

    fn bm25_tf_for(&self, doc_id: &str, token: &str) -> f64 {
        let f = f64::from(self.frequency(doc_id, token));
        let avgdl = self.avg_doc_length();
        let length_ratio = if avgdl > 0.0 {
            self.doc_length(doc_id).unwrap_or(0) as f64 / avgdl
        } else {
            0.0
        };

        let Bm25Params { k1, b } = self.params;
        let denominator = f + k1 * (1.0 - b + b * length_ratio);
        if denominator > 0.0 {
            f * (k1 + 1.0) / denominator
        } else {
            0.0
        }
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Writes the index tables and manifest into `dir`.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn save_index(&self, dir: &Path) -> Result<()> {
        let start = Instant::now();
        let store = IndexDirectory::with_path(dir);
        store.begin_write()?;

        let tables = &self.tables;
        let postings: BTreeMap<&String, &BTreeSet<String>> = tables.postings.iter().collect();
        let term_frequencies: BTreeMap<&String, BTreeMap<&String, &u32>> = tables
            .term_frequencies
            .iter()
            .map(|(id, frequencies)| (id, frequencies.iter().collect()))
            .collect();
        let doc_lengths: BTreeMap<&String, &usize> = tables.doc_lengths.iter().collect();
        let documents: BTreeMap<&String, &Arc<Document>> = tables.documents.iter().collect();

        let entries = vec![
            store.write_json_table(POSTINGS, "postings.json", &postings, postings.len())?,
            store.write_json_table(
                TERM_FREQUENCIES,
                "term_frequencies.json",
                &term_frequencies,
                term_frequencies.len(),
            )?,
            store.write_json_table(DOC_LENGTHS, "doc_lengths.json", &doc_lengths, doc_lengths.len())?,
            store.write_json_table(DOCUMENTS, "documents.json", &documents, documents.len())?,
        ];
        store.commit(&IndexManifest::new(StoreKind::Keyword, documents.len(), entries))?;

        info!(
            "Saved keyword index: {} documents, {} terms in {:.2}ms",
            documents.len(),
            postings.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Replaces the index contents with the tables stored in `dir`.
    ///
    /// Nothing changes unless every table loads and passes validation.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load_index(&mut self, dir: &Path) -> Result<()> {
        let start = Instant::now();
        let store = IndexDirectory::with_path(dir);
        let manifest = store.read_manifest(StoreKind::Keyword)?;

        let postings: HashMap<String, BTreeSet<String>> =
            store.read_json_table(&manifest, POSTINGS, HashMap::len)?;
        let term_frequencies: HashMap<String, HashMap<String, u32>> =
            store.read_json_table(&manifest, TERM_FREQUENCIES, HashMap::len)?;
        let doc_lengths: HashMap<String, usize> =
            store.read_json_table(&manifest, DOC_LENGTHS, HashMap::len)?;
        let documents: HashMap<String, Arc<Document>> =
            store.read_json_table(&manifest, DOCUMENTS, HashMap::len)?;

        if documents.len() != manifest.document_count {
            return Err(store.corrupt(format!(
                "manifest records {} documents, found {}",
                manifest.document_count,
                documents.len()
            )));
        }

        let total_length = doc_lengths.values().sum();
        let tables = KeywordTables {
            postings,
            term_frequencies,
            doc_lengths,
            documents,
            total_length,
        };
        tables.validate(&store)?;

        info!(
            "Loaded keyword index: {} documents, {} terms in {:.2}ms",
            tables.documents.len(),
            tables.postings.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.tables = tables;
        Ok(())
    }
}
