//! Visible text extraction

use scraper::Html;

use super::PageExtractor;

/// Elements whose text content is never visible
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

impl PageExtractor {
    /// Strip all markup from a parsed document.
    ///
    /// Text nodes are joined with single spaces so adjacent elements never
    /// glue words together; whitespace runs collapse to one space.
    pub(super) fn extract_text(document: &Html) -> String {
        let mut text = String::new();

        for node in document.tree.root().descendants() {
            let Some(text_node) = node.value().as_text() else {
                continue;
            };

            let invisible = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|elem| INVISIBLE_ELEMENTS.contains(&elem.name()))
            });
            if invisible {
                continue;
            }

            let trimmed = text_node.trim();
            if !trimmed.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(trimmed);
            }
        }

        Self::normalize_whitespace(&text)
    }

    /// Collapse every whitespace run into a single space
    fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(html: &str) -> String {
        PageExtractor::extract_text(&Html::parse_document(html))
    }

    #[test]
    fn test_adjacent_elements_do_not_merge() {
        assert_eq!(
            text_of("<a>limpito</a><div>lol</div><p>lolazo lolazo</p>"),
            "limpito lol lolazo lolazo"
        );
    }

    #[test]
    fn test_script_and_style_skipped() {
        let html = r#"<html><head><style>body { color: red; }</style>
            <script>var x = "hidden";</script></head>
            <body><p>visible</p><noscript>enable js</noscript></body></html>"#;
        assert_eq!(text_of(html), "visible");
    }

    #[test]
    fn test_comments_skipped_and_whitespace_collapsed() {
        let html = "<p>uno\n\n   dos</p><!-- comentario --><p>\ttres </p>";
        assert_eq!(text_of(html), "uno dos tres");
    }

    #[test]
    fn test_malformed_markup() {
        assert_eq!(text_of("<div><p>sin cerrar <b>negrita"), "sin cerrar negrita");
        assert_eq!(text_of(""), "");
    }
}
