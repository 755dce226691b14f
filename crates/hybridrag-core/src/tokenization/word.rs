use super::{Preprocessor, Segmenter, Tokenizer};
use std::sync::Arc;

/// Whitespace tokenizer for space-delimited languages.
///
/// Pipeline: lowercase, strip punctuation, split on whitespace, drop stop
/// words, stem.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer {
    preprocessor: Arc<Preprocessor>,
}

impl WordTokenizer {
    pub fn new(preprocessor: Arc<Preprocessor>) -> Self {
        Self { preprocessor }
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let stripped = self.preprocessor.remove_punctuation(&text.to_lowercase());
        stripped
            .split_whitespace()
            .filter(|word| !self.preprocessor.is_stop_word(word))
            .map(|word| self.preprocessor.stem(word))
            .collect()
    }
}

/// Tokenizer for languages without word delimiters.
///
/// Pipeline: strip punctuation, segment, drop blank and punctuation-only
/// segments, lowercase, drop stop words, stem. Mixed-script text keeps its
/// Latin words intact, so English terms embedded in Chinese text still stem.
#[derive(Debug, Clone)]
pub struct SegmentedTokenizer<S: Segmenter> {
    preprocessor: Arc<Preprocessor>,
    segmenter: S,
}

impl<S: Segmenter> SegmentedTokenizer<S> {
    pub fn new(preprocessor: Arc<Preprocessor>, segmenter: S) -> Self {
        Self {
            preprocessor,
            segmenter,
        }
    }

    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }
}

impl<S: Segmenter> Tokenizer for SegmentedTokenizer<S> {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let stripped = self.preprocessor.remove_punctuation(text);
        self.segmenter
            .segment(&stripped)
            .iter()
            .map(|segment| segment.trim())
            .filter(|segment| {
                !segment.is_empty() && !self.preprocessor.is_punctuation_token(segment)
            })
            .map(str::to_lowercase)
            .filter(|segment| !self.preprocessor.is_stop_word(segment))
            .map(|segment| self.preprocessor.stem(&segment))
            .collect()
    }
}
