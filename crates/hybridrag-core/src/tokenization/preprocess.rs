use super::stopwords::ENGLISH_STOP_WORDS;
use crate::error::Result;
use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// ASCII punctuation characters.
pub const ASCII_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Full-width and CJK punctuation characters.
pub const CJK_PUNCTUATION: &str =
    "！？｡＂＃＄％＆＇（）＊＋，－／：；＜＝＞＠［＼］＾＿｀｛｜｝～、。《》「」『』【】—…·";

static PUNCTUATION: Lazy<HashSet<char>> = Lazy::new(|| {
    ASCII_PUNCTUATION
        .chars()
        .chain(CJK_PUNCTUATION.chars())
        .collect()
});

/// Shared tokenizer configuration: punctuation set, stop words and stemmer.
///
/// Built once and shared between tokenizers through an `Arc`.
pub struct Preprocessor {
    stop_words: HashSet<String>,
    stemmer: Stemmer,
}

impl Preprocessor {
    /// Creates a preprocessor with the standard English stop words.
    pub fn new() -> Self {
        Self::with_stop_words(std::iter::empty::<String>())
    }

    /// Creates a preprocessor with the standard English stop words plus `custom`.
    pub fn with_stop_words<I, S>(custom: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stop_words: HashSet<String> =
            ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect();
        stop_words.extend(custom.into_iter().map(Into::into));
        Self {
            stop_words,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Creates a preprocessor that adds the stop words listed in `path`.
    ///
    /// The file holds one word per line; lines are trimmed and blank lines
    /// skipped. A missing file is not an error: the standard list is used
    /// alone and a warning is logged.
    pub fn from_stopwords_file(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Custom stop-word file {} not found, using standard list only",
                    path.display()
                );
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let custom: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        debug!(
            "Loaded {} custom stop words from {}",
            custom.len(),
            path.display()
        );
        Ok(Self::with_stop_words(custom))
    }

    /// Removes every punctuation character from `text`.
    pub fn remove_punctuation(&self, text: &str) -> String {
        text.chars().filter(|c| !PUNCTUATION.contains(c)).collect()
    }

    /// True when `token` is non-empty and consists only of punctuation.
    pub fn is_punctuation_token(&self, token: &str) -> bool {
        !token.is_empty() && token.chars().all(|c| PUNCTUATION.contains(&c))
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Reduces `word` to its Snowball English stem.
    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(word).into_owned()
    }

    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preprocessor")
            .field("stop_words", &self.stop_words.len())
            .finish_non_exhaustive()
    }
}
