//! HTML feature extraction
//!
//! Turns the HTML a client submitted into a page visit record:
//! - Unescapes HTML entities
//! - Strips markup to visible text
//! - Collects title, description and keywords metadata
//! - Detects the page language
//! - Computes keyword frequency tables for text and metadata
//!
//! Malformed markup never fails extraction; missing parts come out empty.

mod metadata;
mod text;
mod types;

pub use types::*;

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::TextConfig;
use crate::text::{LanguageClassifier, TextNormalizer, WhatlangClassifier, WordTokenizer};
use crate::types::{KeywordFreqs, PageVisitRecord, RecordId};

/// Page feature extractor
pub struct PageExtractor {
    normalizer: Arc<TextNormalizer>,
    classifier: Box<dyn LanguageClassifier>,
    /// Stem page keyword tables
    stem: bool,
    pub(crate) meta_selector: Option<Selector>,
    pub(crate) title_selector: Option<Selector>,
}

impl fmt::Debug for PageExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageExtractor")
            .field("normalizer", &self.normalizer)
            .field("stem", &self.stem)
            .finish()
    }
}

impl PageExtractor {
    /// Create an extractor using the `whatlang` classifier
    pub fn new(normalizer: Arc<TextNormalizer>, config: &TextConfig) -> Self {
        Self::with_classifier(normalizer, config, Box::new(WhatlangClassifier))
    }

    /// Create an extractor with a custom language classifier
    pub fn with_classifier(
        normalizer: Arc<TextNormalizer>,
        config: &TextConfig,
        classifier: Box<dyn LanguageClassifier>,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            stem: config.stem_page_keywords,
            meta_selector: Selector::parse("meta[name]").ok(),
            title_selector: Selector::parse("title").ok(),
        }
    }

    /// Extract all page features from raw HTML
    pub fn extract(&self, html_code: &str) -> ExtractedPage {
        // Even UTF-8 pages carry entities such as &aacute;
        let raw_html = html_escape::decode_html_entities(html_code).into_owned();

        let document = Html::parse_document(&raw_html);
        let clean_text = Self::extract_text(&document);
        let metadata = self.extract_metadata(&document);

        let language = self.classifier.detect(&clean_text);

        let keyword_freqs = KeywordFreqs {
            text: self.normalizer.frequency_table(&clean_text, language, self.stem),
            metadata: self
                .normalizer
                .frequency_table(&join_metadata(&metadata), language, self.stem),
        };

        debug!(
            "Extracted page: {} words, language {}, {} metadata entries, {} distinct keywords",
            WordTokenizer::count_tokens(&clean_text),
            language,
            metadata.len(),
            keyword_freqs.text.len()
        );

        ExtractedPage {
            raw_html,
            clean_text,
            language,
            metadata,
            keyword_freqs,
        }
    }

    /// Extract features and package them as a not-yet-aggregated record
    pub fn build_record(
        &self,
        user: &str,
        page_url: &str,
        html_code: &str,
        timestamp: DateTime<Utc>,
    ) -> PageVisitRecord {
        let page = self.extract(html_code);
        PageVisitRecord {
            id: RecordId::new(),
            page_url: page_url.to_string(),
            user: user.to_string(),
            timestamp,
            raw_html: page.raw_html,
            clean_text: page.clean_text,
            language: page.language,
            metadata: page.metadata,
            keyword_freqs: page.keyword_freqs,
            processed: false,
        }
    }
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new(Arc::new(TextNormalizer::default()), &TextConfig::default())
    }
}
