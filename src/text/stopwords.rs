//! Stopword lists

use std::collections::HashSet;
use stop_words::LANGUAGE;

/// Union of the NLTK English and Spanish stopword lists.
///
/// English stopwords are removed whatever the page language, since English
/// shows up on nearly every page.
#[derive(Debug, Clone)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    /// English + Spanish lists
    pub fn english_and_spanish() -> Self {
        let mut words = HashSet::new();
        for language in [LANGUAGE::English, LANGUAGE::Spanish] {
            let list = stop_words::get(language);
            words.extend(list.iter().map(|w| w.to_lowercase()));
        }
        Self { words }
    }

    /// Add words to the set
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words
            .extend(extra.into_iter().map(|w| w.as_ref().trim().to_lowercase()));
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopwordSet {
    fn default() -> Self {
        Self::english_and_spanish()
    }
}
