//! Text tokenization for the keyword index.
//!
//! Every tokenizer turns raw text into a list of normalized terms (lowercased,
//! punctuation and stop words removed, stemmed). The keyword index only sees
//! the [`Tokenizer`] trait, so the language-specific pipeline is chosen once
//! at construction:
//!
//! - [`WordTokenizer`] - whitespace-delimited languages (English)
//! - [`SegmentedTokenizer`] - languages without word delimiters, backed by a
//!   pluggable [`Segmenter`] ([`CjkUnigramSegmenter`] ships as the default)
//!
//! [`LanguageTokenizer`] picks between the two from a [`Language`] value.

mod preprocess;
mod segmenter;
mod stopwords;
mod word;

pub use preprocess::{Preprocessor, ASCII_PUNCTUATION, CJK_PUNCTUATION};
pub use segmenter::{CjkUnigramSegmenter, Segmenter};
pub use stopwords::ENGLISH_STOP_WORDS;
pub use word::{SegmentedTokenizer, WordTokenizer};

use crate::config::RetrievalConfig;
use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Converts text into index terms.
pub trait Tokenizer: Send + Sync {
    /// Returns the terms of `text` in order, duplicates included.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<T: Tokenizer + ?Sized> Tokenizer for Arc<T> {
    fn tokenize(&self, text: &str) -> Vec<String> {
        (**self).tokenize(text)
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn tokenize(&self, text: &str) -> Vec<String> {
        (**self).tokenize(text)
    }
}

/// Tokenizes `term` and returns its only token.
///
/// # Errors
///
/// [`SearchError::InvalidTerm`] when the term yields zero tokens (stop word,
/// punctuation, empty) or more than one.
pub fn single_token<T: Tokenizer + ?Sized>(tokenizer: &T, term: &str) -> Result<String> {
    let tokens = tokenizer.tokenize(term);
    let token_count = tokens.len();
    let mut tokens = tokens.into_iter();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => Ok(token),
        _ => Err(SearchError::InvalidTerm {
            term: term.to_string(),
            token_count,
        }),
    }
}

/// Corpus language, used to select the tokenization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "zh", alias = "chinese")]
    Chinese,
}

impl FromStr for Language {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "zh" | "chinese" => Ok(Language::Chinese),
            other => Err(SearchError::Config(format!("unknown language: {other}"))),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "en"),
            Language::Chinese => write!(f, "zh"),
        }
    }
}

/// Tokenizer selected at runtime from a [`Language`].
#[derive(Debug, Clone)]
pub enum LanguageTokenizer {
    Word(WordTokenizer),
    Segmented(SegmentedTokenizer<CjkUnigramSegmenter>),
}

impl LanguageTokenizer {
    pub fn for_language(language: Language, preprocessor: Arc<Preprocessor>) -> Self {
        match language {
            Language::English => LanguageTokenizer::Word(WordTokenizer::new(preprocessor)),
            Language::Chinese => LanguageTokenizer::Segmented(SegmentedTokenizer::new(
                preprocessor,
                CjkUnigramSegmenter,
            )),
        }
    }

    /// Builds the tokenizer described by `config`, loading its custom
    /// stop-word file if one is set.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        let preprocessor = match &config.custom_stopwords {
            Some(path) => Preprocessor::from_stopwords_file(path)?,
            None => Preprocessor::new(),
        };
        Ok(Self::for_language(config.language, Arc::new(preprocessor)))
    }

    pub fn language(&self) -> Language {
        match self {
            LanguageTokenizer::Word(_) => Language::English,
            LanguageTokenizer::Segmented(_) => Language::Chinese,
        }
    }
}

impl Tokenizer for LanguageTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        match self {
            LanguageTokenizer::Word(tokenizer) => tokenizer.tokenize(text),
            LanguageTokenizer::Segmented(tokenizer) => tokenizer.tokenize(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_token() {
        let tokenizer = WordTokenizer::default();
        assert_eq!(single_token(&tokenizer, "Running").unwrap(), "run");
    }

    #[test]
    fn test_single_token_rejects_phrases_and_stop_words() {
        let tokenizer = WordTokenizer::default();
        assert!(matches!(
            single_token(&tokenizer, "new york"),
            Err(SearchError::InvalidTerm { token_count: 2, .. })
        ));
        assert!(matches!(
            single_token(&tokenizer, "the"),
            Err(SearchError::InvalidTerm { token_count: 0, .. })
        ));
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert_eq!(" chinese ".parse::<Language>().unwrap(), Language::Chinese);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::Chinese.to_string(), "zh");
    }

    #[test]
    fn test_language_tokenizer_selection() {
        let pre = Arc::new(Preprocessor::new());
        let english = LanguageTokenizer::for_language(Language::English, Arc::clone(&pre));
        let chinese = LanguageTokenizer::for_language(Language::Chinese, pre);

        assert_eq!(english.language(), Language::English);
        assert_eq!(english.tokenize("北京大学"), vec!["北京大学"]);
        assert_eq!(chinese.tokenize("北京大学"), vec!["北", "京", "大", "学"]);
    }

    #[test]
    fn test_from_config_uses_custom_stop_words() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stopwords.txt");
        std::fs::write(&path, "rust\n").unwrap();

        let config = RetrievalConfig {
            custom_stopwords: Some(path),
            ..RetrievalConfig::default()
        };
        let tokenizer = LanguageTokenizer::from_config(&config).unwrap();
        assert_eq!(tokenizer.tokenize("rust programming"), vec!["program"]);
    }
}
