//! Text normalization policy

use serde::{Deserialize, Serialize};

/// Longest word kept in keyword tables, in characters
pub const DEFAULT_MAX_WORD_LENGTH: usize = 50;

/// Text normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Tokens longer than this are dropped
    pub max_word_length: usize,
    /// Stem page keyword tables (search queries are always stemmed)
    pub stem_page_keywords: bool,
    /// Words removed in addition to the English and Spanish stopword lists
    pub extra_stopwords: Vec<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_word_length: DEFAULT_MAX_WORD_LENGTH,
            stem_page_keywords: false,
            extra_stopwords: Vec::new(),
        }
    }
}
