//! Page extraction types

use std::collections::BTreeMap;

use crate::types::{KeywordFreqs, Language, MetaProperty};

/// Features extracted from one HTML document
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// Markup with HTML entities unescaped
    pub raw_html: String,
    /// Visible text, markup stripped and whitespace collapsed
    pub clean_text: String,
    /// Detected language (English when unsupported or unknown)
    pub language: Language,
    /// Allow-listed metadata (title, description, keywords)
    pub metadata: BTreeMap<MetaProperty, String>,
    /// Frequency tables for body text and metadata text
    pub keyword_freqs: KeywordFreqs,
}

impl ExtractedPage {
    /// All metadata values joined by a space
    pub fn metadata_text(&self) -> String {
        join_metadata(&self.metadata)
    }
}

pub(super) fn join_metadata(metadata: &BTreeMap<MetaProperty, String>) -> String {
    metadata.values().map(String::as_str).collect::<Vec<_>>().join(" ")
}
