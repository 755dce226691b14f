// Reciprocal Rank Fusion (RRF) algorithm

use super::types::{rank_scored, Document, SearchResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Standard RRF k parameter value from academic literature.
///
/// This constant (60) is the recommended value from the original RRF paper:
/// "Reciprocal Rank Fusion outperforms Condorcet and individual Rank Learning Methods"
/// by Cormack, Clarke, and Buettcher (SIGIR 2009).
///
/// The k parameter controls how much weight is given to top-ranked items:
/// - Smaller k → more emphasis on top results
/// - Larger k → more uniform weighting across ranks
pub const RRF_K: f64 = 60.0;

/// Combine two ranked result lists using RRF
///
/// RRF Formula: RRF_score(d) = sum_{r} 1 / (k + rank_r(d))
///
/// Where:
/// - d is a document
/// - r is a ranker (search method)
/// - rank_r(d) is the `rank` field of d's result in ranker r (1-indexed)
/// - k is a constant (typically 60) to reduce impact of high rankings
///
/// Only ranks matter; the input scores are ignored. Documents are matched by
/// id. The fused list contains every document from either input, ordered by
/// fused score descending with ties broken by ascending id, and re-ranked
/// from 1.
pub fn reciprocal_rank_fusion(
    results_a: &[SearchResult],
    results_b: &[SearchResult],
    k: f64,
) -> Vec<SearchResult> {
    let mut rrf_scores: HashMap<&str, (Arc<Document>, f64)> = HashMap::new();

    // List a is summed before list b, so a document's score never depends on
    // hash iteration order.
    for result in results_a.iter().chain(results_b) {
        let contribution = 1.0 / (k + result.rank as f64);
        rrf_scores
            .entry(result.document.id.as_str())
            .or_insert_with(|| (Arc::clone(&result.document), 0.0))
            .1 += contribution;
    }

    let fused_len = rrf_scores.len();
    rank_scored(rrf_scores.into_values().collect(), fused_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a ranked list from ids in rank order; scores are arbitrary.
    fn ranked(ids: &[&str], scores: &[f64]) -> Vec<SearchResult> {
        ids.iter()
            .zip(scores)
            .enumerate()
            .map(|(i, (id, &score))| SearchResult {
                document: Arc::new(Document::new(*id, "")),
                score,
                rank: i + 1,
            })
            .collect()
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.document.id.as_str()).collect()
    }

    fn score_of(results: &[SearchResult], id: &str) -> f64 {
        results
            .iter()
            .find(|r| r.document.id == id)
            .map(|r| r.score)
            .unwrap()
    }

    #[test]
    fn test_rrf() {
        // Simulate results from two different search methods
        let vector_results = ranked(&["1", "2", "3"], &[0.9, 0.8, 0.7]);
        let keyword_results = ranked(&["3", "1", "4"], &[10.0, 8.0, 5.0]);

        let fused = reciprocal_rank_fusion(&vector_results, &keyword_results, RRF_K);

        // Docs 1 and 3 appear in both lists and must lead
        assert_eq!(fused.len(), 4);
        let top: Vec<&str> = ids(&fused).into_iter().take(2).collect();
        assert!(top.contains(&"1"));
        assert!(top.contains(&"3"));
    }

    #[test]
    fn test_rrf_first_in_both_beats_first_in_one() {
        let a = ranked(&["x", "y"], &[0.9, 0.8]);
        let b = ranked(&["x", "z"], &[7.0, 3.0]);

        let fused = reciprocal_rank_fusion(&a, &b, RRF_K);

        assert_eq!(fused[0].document.id, "x");
        assert!((fused[0].score - 2.0 / 61.0).abs() < 1e-12);
        // y: 1/62 from a, z: 1/62 from b; tie broken by id
        assert_eq!(ids(&fused), vec!["x", "y", "z"]);
        assert!((score_of(&fused, "y") - 1.0 / 62.0).abs() < 1e-12);
    }

    #[test]
    fn test_rrf_single_list_score() {
        let a = ranked(&["only"], &[0.5]);
        let fused = reciprocal_rank_fusion(&a, &[], RRF_K);
        assert!((fused[0].score - 1.0 / 61.0).abs() < 1e-12);
    }

    #[test]
    fn test_rrf_empty_inputs() {
        let results_b = ranked(&["1", "2"], &[1.0, 0.9]);

        let fused = reciprocal_rank_fusion(&[], &results_b, RRF_K);

        assert_eq!(ids(&fused), vec!["1", "2"]);
    }

    #[test]
    fn test_rrf_both_empty() {
        assert!(reciprocal_rank_fusion(&[], &[], RRF_K).is_empty());
    }

    #[test]
    fn test_rrf_single_ranker() {
        let results_a = ranked(&["1", "2", "3"], &[10.0, 8.0, 5.0]);

        let fused = reciprocal_rank_fusion(&results_a, &[], RRF_K);

        // With only one ranker, should preserve original order
        assert_eq!(ids(&fused), vec!["1", "2", "3"]);
        let ranks: Vec<usize> = fused.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_rrf_k_parameter_impact() {
        let a = ranked(&["1", "2"], &[0.9, 0.8]);
        let b = ranked(&["3"], &[1.0]);

        let small_k = reciprocal_rank_fusion(&a, &b, 1.0);
        let large_k = reciprocal_rank_fusion(&a, &b, 100.0);

        // Smaller k widens the gap between rank 1 and rank 2
        let gap = |fused: &[SearchResult]| score_of(fused, "1") - score_of(fused, "2");
        assert!(gap(&small_k) > gap(&large_k));
    }

    #[test]
    fn test_rrf_score_independence() {
        // RRF should use ranks only, not original scores
        let results_a = ranked(&["1", "2"], &[100.0, 0.01]);
        let results_b = ranked(&["2", "1"], &[0.99, 0.01]);

        let fused = reciprocal_rank_fusion(&results_a, &results_b, RRF_K);

        // Doc 1: 1/(k+1) + 1/(k+2), Doc 2: 1/(k+2) + 1/(k+1)
        assert_eq!(score_of(&fused, "1"), score_of(&fused, "2"));
        assert_eq!(ids(&fused), vec!["1", "2"]);
    }

    #[test]
    fn test_rrf_uses_result_rank_field() {
        let mut a = ranked(&["deep"], &[0.1]);
        a[0].rank = 10;
        let fused = reciprocal_rank_fusion(&a, &[], RRF_K);
        assert!((fused[0].score - 1.0 / 70.0).abs() < 1e-12);
        assert_eq!(fused[0].rank, 1);
    }

    #[test]
    fn test_rrf_shares_documents() {
        let a = ranked(&["1"], &[1.0]);
        let fused = reciprocal_rank_fusion(&a, &[], RRF_K);
        assert!(Arc::ptr_eq(&fused[0].document, &a[0].document));
    }
}
