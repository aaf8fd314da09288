//! Word tokenization

use unicode_segmentation::UnicodeSegmentation;

/// Word tokenizer on Unicode word boundaries (UAX #29).
///
/// Punctuation-only segments are never produced; punctuation inside a word
/// (`noti.cias`, `don't`) stays attached and is stripped later.
pub struct WordTokenizer;

impl WordTokenizer {
    /// Split text into word tokens
    pub fn tokenize(text: &str) -> Vec<&str> {
        text.unicode_words().collect()
    }

    /// Count word tokens in text
    pub fn count_tokens(text: &str) -> usize {
        text.unicode_words().count()
    }
}

/// Remove ASCII punctuation characters from a token
pub fn strip_punctuation(token: &str) -> String {
    token.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}
