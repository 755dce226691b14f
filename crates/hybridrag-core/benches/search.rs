//! Benchmarks for search operations (cosine scan, BM25, hybrid).
//!
//! Run with: `cargo bench -p hybridrag-core --bench search`
//!
//! These benchmarks measure the performance of:
//! - Exhaustive vector similarity search
//! - Keyword search (BM25)
//! - Hybrid search with RRF fusion
//! - Various k values and index sizes
//!
//! # Production Configuration
//!
//! These benchmarks use constants from `hybridrag_core::config` so that
//! dimensions and BM25 parameters match production settings.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hybridrag_core::config::{Bm25Params, RetrievalConfig, DEFAULT_EMBEDDING_DIM};
use hybridrag_core::embedding::HashingEmbedder;
use hybridrag_core::search::{
    reciprocal_rank_fusion, Document, KeywordIndex, Retriever, SearchResult, VectorStore, RRF_K,
};
use hybridrag_core::tokenization::WordTokenizer;
use std::sync::Arc;

// =============================================================================
// Benchmark Configuration
// =============================================================================

/// Seed used for generating query embeddings.
///
/// Must differ from document seeds (0..N where N is index size) so the query
/// isn't an exact match for any indexed document.
const QUERY_EMBEDDING_SEED: u64 = 1_000_000;

// =============================================================================
// Test Data Generation
// =============================================================================

/// Generate a deterministic L2-normalized embedding with a seed.
fn seeded_embedding(seed: u64) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let raw: Vec<f32> = (0..DEFAULT_EMBEDDING_DIM)
        .map(|i| {
            let mut hasher = DefaultHasher::new();
            seed.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            ((h as f32 / u64::MAX as f32) * 2.0) - 1.0
        })
        .collect();

    let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    raw.into_iter().map(|x| x / norm).collect()
}

/// Generate document text. Content varies by id for a realistic BM25 term
/// distribution.
fn sample_text(id: u64) -> String {
    let topics = [
        "machine learning algorithms and neural network architectures",
        "semantic search engines and information retrieval systems",
        "natural language processing and text understanding",
        "vector embeddings and similarity metrics",
        "transformer models and attention mechanisms",
        "customer support tickets and password resets",
        "text classification and sentiment analysis",
        "knowledge graphs and entity recognition",
    ];
    let topic = topics[(id % topics.len() as u64) as usize];

    format!(
        "Document {id} provides a comprehensive analysis of {topic}. \
         This section explores the fundamental concepts and practical applications \
         that have emerged from recent advances in the field. Key considerations \
         when working with {topic} include computational efficiency, memory usage, \
         and the trade-offs between accuracy and speed. Document identifier: {id}.",
        id = id,
        topic = topic
    )
}

fn sample_document(id: u64) -> Document {
    Document::new(format!("doc-{id:05}"), sample_text(id))
}

fn build_vector_store(size: usize) -> VectorStore {
    let mut store = VectorStore::new(DEFAULT_EMBEDDING_DIM);
    for i in 0..size as u64 {
        let document = sample_document(i);
        store
            .add(document.id.clone(), seeded_embedding(i), document)
            .unwrap();
    }
    store
}

fn build_keyword_index(size: usize) -> KeywordIndex<WordTokenizer> {
    let mut index = KeywordIndex::new(Arc::new(WordTokenizer::default()), Bm25Params::default());
    index.build_index((0..size as u64).map(sample_document));
    index
}

fn build_retriever(size: usize) -> Retriever<HashingEmbedder, WordTokenizer> {
    let retriever = Retriever::new(
        HashingEmbedder::new(DEFAULT_EMBEDDING_DIM),
        Arc::new(WordTokenizer::default()),
        RetrievalConfig::default(),
    );
    retriever
        .build((0..size as u64).map(sample_document).collect())
        .unwrap();
    retriever
}

// ============================================================================
// Vector Search Benchmarks
// ============================================================================

/// Benchmark: Vector search with varying k values
///
/// The scan cost is fixed; k only changes the truncation after sorting.
fn bench_vector_search_varying_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/search_by_k");
    group.sample_size(100);

    let store = build_vector_store(600);
    let query = seeded_embedding(QUERY_EMBEDDING_SEED);

    for k in [1, 5, 10, 20, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| store.search(black_box(&query), k).unwrap());
        });
    }
    group.finish();
}

/// Benchmark: Vector search with varying index sizes (linear scan)
fn bench_vector_search_varying_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/search_by_size");
    group.sample_size(100);

    let k = 10;
    let query = seeded_embedding(QUERY_EMBEDDING_SEED);

    for size in [100, 300, 600, 1000, 2000] {
        let store = build_vector_store(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| store.search(black_box(&query), k).unwrap());
        });
    }
    group.finish();
}

// ============================================================================
// BM25 Keyword Search Benchmarks
// ============================================================================

/// Benchmark: BM25 search with varying index sizes
fn bench_bm25_search_varying_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25/search_by_size");
    group.sample_size(100);

    let k = 10;
    let query = "machine learning semantic search";

    for size in [100, 300, 600, 1000, 2000] {
        let index = build_keyword_index(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| index.search(black_box(query), k));
        });
    }
    group.finish();
}

/// Benchmark: BM25 search with varying query lengths
fn bench_bm25_search_varying_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25/search_by_query_length");
    group.sample_size(100);

    let index = build_keyword_index(600);
    let k = 10;

    let queries = [
        ("1_word", "machine"),
        ("3_words", "machine learning search"),
        ("5_words", "machine learning semantic search retrieval"),
        (
            "10_words",
            "machine learning semantic search retrieval neural network embedding vector similarity",
        ),
    ];

    for (name, query) in queries {
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, query| {
            b.iter(|| index.search(black_box(query), k));
        });
    }
    group.finish();
}

/// Benchmark: building the keyword index from scratch
fn bench_bm25_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25/build");
    group.sample_size(20);

    for size in [100, 1000] {
        let documents: Vec<Document> = (0..size as u64).map(sample_document).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut index =
                    KeywordIndex::new(Arc::new(WordTokenizer::default()), Bm25Params::default());
                index.build_index(black_box(documents.clone()));
                index
            });
        });
    }
    group.finish();
}

// ============================================================================
// Hybrid Search Benchmarks
// ============================================================================

/// Benchmark: Full hybrid search pipeline
///
/// This measures the complete search path:
/// 1. Query embedding
/// 2. Vector scan and BM25 search over `k * 5` candidates
/// 3. RRF fusion
fn bench_hybrid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid/search");
    group.sample_size(50);

    let k = 10;
    let query_text = "machine learning semantic search";

    for size in [100, 300, 600, 1000] {
        let retriever = build_retriever(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| retriever.hybrid_search(black_box(query_text), k).unwrap());
        });
    }
    group.finish();
}

/// Benchmark: Hybrid search with varying k values
fn bench_hybrid_search_varying_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid/search_by_k");
    group.sample_size(50);

    let query_text = "machine learning semantic search";
    let retriever = build_retriever(600);

    for k in [1, 5, 10, 20, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| retriever.hybrid_search(black_box(query_text), k).unwrap());
        });
    }
    group.finish();
}

// ============================================================================
// RRF Fusion Benchmarks
// ============================================================================

fn mock_ranking(ids: impl Iterator<Item = usize>) -> Vec<SearchResult> {
    ids.enumerate()
        .map(|(i, id)| SearchResult {
            document: Arc::new(Document::new(format!("doc-{id:05}"), "")),
            score: 1.0 / (i + 1) as f64,
            rank: i + 1,
        })
        .collect()
}

/// Benchmark: RRF fusion algorithm in isolation
fn bench_rrf_fusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("rrf/fusion");
    group.sample_size(1000);

    for size in [10, 50, 100, 200] {
        let vector_results = mock_ranking(0..size);
        let keyword_results = mock_ranking((0..size).rev());

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                reciprocal_rank_fusion(
                    black_box(&vector_results),
                    black_box(&keyword_results),
                    RRF_K,
                )
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_vector_search_varying_k,
    bench_vector_search_varying_size,
    bench_bm25_search_varying_size,
    bench_bm25_search_varying_query,
    bench_bm25_build,
    bench_hybrid_search,
    bench_hybrid_search_varying_k,
    bench_rrf_fusion,
);
criterion_main!(benches);
