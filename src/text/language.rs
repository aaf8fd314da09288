//! Language identification

use crate::types::Language;

/// Language classifier capability: text -> language code
pub trait LanguageClassifier: Send + Sync {
    /// ISO 639 code of the detected language, if any
    fn classify(&self, text: &str) -> Option<String>;

    /// Detected language restricted to the supported set.
    /// Unknown or unsupported codes fall back to English.
    fn detect(&self, text: &str) -> Language {
        self.classify(text)
            .map(|code| Language::from_code(&code))
            .unwrap_or_default()
    }
}

/// Trigram classifier backed by `whatlang`
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangClassifier;

impl LanguageClassifier for WhatlangClassifier {
    fn classify(&self, text: &str) -> Option<String> {
        whatlang::detect_lang(text).map(|lang| lang.code().to_string())
    }
}

/// Classifier that always answers the same language
#[derive(Debug, Clone, Copy)]
pub struct FixedLanguage(pub Language);

impl LanguageClassifier for FixedLanguage {
    fn classify(&self, _text: &str) -> Option<String> {
        Some(self.0.as_str().to_string())
    }
}

/// Detect the language of a text with the default classifier
pub fn detect_language(text: &str) -> Language {
    WhatlangClassifier.detect(text)
}
