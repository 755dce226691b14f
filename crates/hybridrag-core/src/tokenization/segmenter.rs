/// Splits text into word segments for languages written without spaces.
///
/// Real segmenters (dictionary or model based) live outside this crate and
/// plug in through this trait. Any `Fn(&str) -> Vec<String>` closure is also
/// a segmenter.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

impl<F> Segmenter for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn segment(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Dictionary-free segmenter: each CJK character is one segment, runs of
/// other non-whitespace characters form one segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct CjkUnigramSegmenter;

impl Segmenter for CjkUnigramSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut run = String::new();

        for ch in text.chars() {
            if ch.is_whitespace() || is_cjk(ch) {
                if !run.is_empty() {
                    segments.push(std::mem::take(&mut run));
                }
                if !ch.is_whitespace() {
                    segments.push(ch.to_string());
                }
            } else {
                run.push(ch);
            }
        }
        if !run.is_empty() {
            segments.push(run);
        }
        segments
    }
}

/// CJK ideographs, kana and hangul syllables.
fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3040..=0x30FF     // hiragana, katakana
            | 0x3400..=0x4DBF   // CJK extension A
            | 0x4E00..=0x9FFF   // CJK unified ideographs
            | 0xAC00..=0xD7AF   // hangul syllables
            | 0xF900..=0xFAFF   // CJK compatibility ideographs
            | 0x20000..=0x2A6DF // CJK extension B
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unigram_segments_cjk_characters() {
        let segments = CjkUnigramSegmenter.segment("我爱北京");
        assert_eq!(segments, vec!["我", "爱", "北", "京"]);
    }

    #[test]
    fn test_mixed_script_keeps_latin_runs() {
        let segments = CjkUnigramSegmenter.segment("使用Rust编程 today");
        assert_eq!(segments, vec!["使", "用", "Rust", "编", "程", "today"]);
    }

    #[test]
    fn test_closure_segmenter() {
        let by_dash = |text: &str| text.split('-').map(str::to_string).collect::<Vec<_>>();
        assert_eq!(by_dash.segment("北京-大学"), vec!["北京", "大学"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(CjkUnigramSegmenter.segment("   ").is_empty());
    }
}
