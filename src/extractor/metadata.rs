//! Metadata extraction: allow-listed meta tags and the page title

use scraper::Html;
use std::collections::BTreeMap;

use super::PageExtractor;
use crate::types::MetaProperty;

impl PageExtractor {
    /// Collect allow-listed metadata from a parsed document.
    ///
    /// `<meta name="description|keywords" content="...">` and `<title>`.
    /// When a property occurs more than once the last occurrence wins.
    /// Empty values are ignored.
    pub(super) fn extract_metadata(&self, document: &Html) -> BTreeMap<MetaProperty, String> {
        let mut metadata = BTreeMap::new();

        if let Some(selector) = &self.meta_selector {
            for elem in document.select(selector) {
                let Some(property) = elem.value().attr("name").and_then(MetaProperty::from_meta_name)
                else {
                    continue;
                };
                if let Some(content) = elem.value().attr("content") {
                    let trimmed = content.trim();
                    if !trimmed.is_empty() {
                        metadata.insert(property, trimmed.to_string());
                    }
                }
            }
        }

        if let Some(selector) = &self.title_selector {
            for elem in document.select(selector) {
                let title = elem.text().collect::<String>();
                let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
                if !title.is_empty() {
                    metadata.insert(MetaProperty::Title, title);
                }
            }
        }

        metadata
    }
}
