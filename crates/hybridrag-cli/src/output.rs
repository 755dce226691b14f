//! Output formatting for search results.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use crate::build::BuildSummary;
use hybridrag_core::search::Metadata;
use hybridrag_core::{Document, SearchResult};
use serde::Serialize;

/// Maximum characters to show in text snippet
const SNIPPET_MAX_LEN: usize = 200;

/// JSON output structure for search results
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub query: &'a str,
    pub method: &'a str,
    pub results: Vec<JsonResult<'a>>,
}

/// One ranked document in JSON format
#[derive(Serialize)]
pub struct JsonResult<'a> {
    pub rank: usize,
    pub id: &'a str,
    pub score: f64,
    pub snippet: String,
    #[serde(skip_serializing_if = "no_metadata")]
    pub metadata: &'a Metadata,
}

fn no_metadata(metadata: &&Metadata) -> bool {
    metadata.is_empty()
}

impl<'a> From<&'a SearchResult> for JsonResult<'a> {
    fn from(result: &'a SearchResult) -> Self {
        Self {
            rank: result.rank,
            id: &result.document.id,
            score: result.score,
            snippet: truncate_text(&result.document.content, SNIPPET_MAX_LEN),
            metadata: &result.document.metadata,
        }
    }
}

/// Formats search results as JSON.
pub fn format_json(query: &str, method: &str, results: &[SearchResult]) -> String {
    let output = JsonOutput {
        query,
        method,
        results: results.iter().map(JsonResult::from).collect(),
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats search results for human-readable terminal output.
pub fn format_human(query: &str, method: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results found for \"{}\"", query);
    }

    let mut output = String::new();
    output.push_str(&format!(
        "Found {} result{} for \"{}\" ({}):\n\n",
        results.len(),
        if results.len() == 1 { "" } else { "s" },
        query,
        method
    ));

    for result in results {
        output.push_str(&format!(
            "{}. {} (score: {:.4})\n",
            result.rank, result.document.id, result.score
        ));

        let snippet = truncate_text(&result.document.content, SNIPPET_MAX_LEN);
        output.push_str(&format!("   {}\n", indent_text(&snippet, "   ")));
        output.push('\n');
    }

    output.trim_end().to_string()
}

/// Formats a single document, full content included.
pub fn format_document(document: &Document, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(document).unwrap_or_else(|_| "{}".to_string());
    }

    let mut output = format!("{}\n\n{}", document.id, document.content.trim());
    if !document.metadata.is_empty() {
        output.push_str("\n\nMetadata:");
        for (key, value) in &document.metadata {
            output.push_str(&format!("\n   {}: {}", key, value));
        }
    }
    output
}

/// Formats the result of a build.
pub fn format_build(summary: &BuildSummary, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string());
    }
    format!(
        "Indexed {} document{} ({} dimensions) into {}",
        summary.documents,
        if summary.documents == 1 { "" } else { "s" },
        summary.dimension,
        summary.index_dir.display()
    )
}

/// Truncates text to a maximum length, adding ellipsis if needed.
fn truncate_text(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.len() <= max_len {
        return text.to_string();
    }

    // Cut on a char boundary, then back off to a word boundary
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &text[..end];
    match truncated.rfind(' ') {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}

/// Indents all lines of text after the first line.
fn indent_text(text: &str, indent: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn make_result(id: &str, text: &str, score: f64, rank: usize) -> SearchResult {
        SearchResult {
            document: Arc::new(Document::new(id, text)),
            score,
            rank,
        }
    }

    #[test]
    fn test_format_human_empty() {
        let output = format_human("test query", "hybrid", &[]);
        assert!(output.contains("No results found"));
    }

    #[test]
    fn test_format_human_single() {
        let results = vec![make_result("faq-1", "This is test content", 0.85, 1)];
        let output = format_human("test", "keyword", &results);
        assert!(output.contains("1 result for"));
        assert!(output.contains("1. faq-1"));
        assert!(output.contains("0.8500"));
        assert!(output.contains("(keyword)"));
    }

    #[test]
    fn test_format_json() {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), "faq".into());
        let result = SearchResult {
            document: Arc::new(Document::new("doc-7", "Content here").with_metadata(metadata)),
            score: 0.5,
            rank: 1,
        };
        let output = format_json("query", "semantic", &[result]);
        assert!(output.contains("\"query\": \"query\""));
        assert!(output.contains("\"method\": \"semantic\""));
        assert!(output.contains("\"id\": \"doc-7\""));
        assert!(output.contains("\"score\": 0.5"));
        assert!(output.contains("\"rank\": 1"));
        assert!(output.contains("\"source\": \"faq\""));
    }

    #[test]
    fn test_format_json_omits_empty_metadata() {
        let results = vec![make_result("a", "text", 1.0, 1)];
        assert!(!format_json("q", "hybrid", &results).contains("metadata"));
    }

    #[test]
    fn test_format_document() {
        let document = Document::new("faq-2", "  Full content  ");
        assert_eq!(format_document(&document, false), "faq-2\n\nFull content");
        assert!(format_document(&document, true).contains("\"id\": \"faq-2\""));
    }

    #[test]
    fn test_format_build() {
        let summary = BuildSummary {
            documents: 3,
            dimension: 384,
            generation: 1,
            index_dir: PathBuf::from("/data/index"),
        };
        assert_eq!(
            format_build(&summary, false),
            "Indexed 3 documents (384 dimensions) into /data/index"
        );
    }

    #[test]
    fn test_truncate_text() {
        let short = "Short text";
        assert_eq!(truncate_text(short, 50), short);

        let long = "This is a much longer text that should be truncated at a reasonable point";
        let truncated = truncate_text(long, 30);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 33); // 30 + "..."
    }

    #[test]
    fn test_truncate_text_multibyte() {
        let text = "检索".repeat(100);
        let truncated = truncate_text(&text, 10);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 13);
    }
}
