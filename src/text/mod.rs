//! Text normalization
//!
//! Turns free text into the cleaned word sequence used for keyword tables:
//! tokenize, lowercase, strip punctuation, drop stopwords, drop invalid
//! tokens, optionally stem. The order of the steps matters.

mod language;
mod stopwords;
mod tokenizer;

pub use language::{detect_language, FixedLanguage, LanguageClassifier, WhatlangClassifier};
pub use stopwords::StopwordSet;
pub use tokenizer::{strip_punctuation, WordTokenizer};

use rust_stemmers::{Algorithm, Stemmer};
use std::fmt;

use crate::config::TextConfig;
use crate::types::{FrequencyTable, Language};

/// Text normalizer holding the stopword set and one stemmer per language
pub struct TextNormalizer {
    stopwords: StopwordSet,
    max_word_length: usize,
    spanish: Stemmer,
    english: Stemmer,
}

impl fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("stopwords", &self.stopwords.len())
            .field("max_word_length", &self.max_word_length)
            .finish()
    }
}

impl TextNormalizer {
    /// Create a normalizer from the text policy
    pub fn new(config: &TextConfig) -> Self {
        Self {
            stopwords: StopwordSet::english_and_spanish().with_extra(&config.extra_stopwords),
            max_word_length: config.max_word_length,
            spanish: Stemmer::create(Algorithm::Spanish),
            english: Stemmer::create(Algorithm::English),
        }
    }

    /// Cleaned word sequence of `text`, stemmed for `language` if `stem` is set
    pub fn normalize(&self, text: &str, language: Language, stem: bool) -> Vec<String> {
        let words = WordTokenizer::tokenize(text)
            .into_iter()
            .map(str::to_lowercase)
            .map(|token| strip_punctuation(&token))
            .filter(|token| !token.is_empty())
            .filter(|token| !self.stopwords.contains(token))
            .filter(|token| self.is_valid(token));

        if stem {
            let stemmer = self.stemmer(language);
            words.map(|w| stemmer.stem(&w).into_owned()).collect()
        } else {
            words.collect()
        }
    }

    /// Occurrence count of every normalized word of `text`
    pub fn frequency_table(&self, text: &str, language: Language, stem: bool) -> FrequencyTable {
        FrequencyTable::from_words(self.normalize(text, language, stem))
    }

    /// Stem a single, already normalized word
    pub fn stem(&self, word: &str, language: Language) -> String {
        self.stemmer(language).stem(word).into_owned()
    }

    /// Digits-only, single-character and over-long tokens carry no keyword value
    fn is_valid(&self, token: &str) -> bool {
        let length = token.chars().count();
        if length <= 1 || length > self.max_word_length {
            return false;
        }
        !token.chars().all(char::is_numeric)
    }

    fn stemmer(&self, language: Language) -> &Stemmer {
        match language {
            Language::Spanish => &self.spanish,
            Language::English => &self.english,
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(&TextConfig::default())
    }
}
