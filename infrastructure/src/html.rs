//! HTML text extraction
//!
//! Pulls readable text out of scraped pages as block-level units, skipping
//! scripts, styles and embedded vector graphics.

use scraper::{ElementRef, Html, Selector};

use researcher_application::ports::scrape::TextExtractor;

// Tags whose entire subtree should be ignored
const SKIP_TAGS: [&str; 4] = ["script", "style", "noscript", "svg"];

const BLOCK_TAGS: [&str; 9] = [
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote",
];

pub struct HtmlTextExtractor;

impl TextExtractor for HtmlTextExtractor {
    fn extract(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let block_selector =
            Selector::parse("p, h1, h2, h3, h4, h5, h6, li, blockquote").unwrap();

        let mut blocks: Vec<String> = Vec::new();
        for element in document.select(&block_selector) {
            // Only outermost blocks; nested ones are covered by the parent.
            let nested = element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| BLOCK_TAGS.contains(&a.value().name()));
            if nested {
                continue;
            }
            let text = clean_whitespace(&collect_element_text(element).join(" "));
            if !text.is_empty() {
                blocks.push(text);
            }
        }

        if blocks.is_empty() {
            // Pages without block markup still count if raw text exists.
            let raw = collect_element_text(document.root_element()).join(" ");
            let text = clean_whitespace(&raw);
            if !text.is_empty() {
                blocks.push(text);
            }
        }

        blocks
    }
}

/// Recursively collect text from an element, skipping ignored subtrees
fn collect_element_text(element: ElementRef) -> Vec<String> {
    if SKIP_TAGS.contains(&element.value().name()) {
        return Vec::new();
    }

    let mut parts = Vec::new();
    for child in element.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            scraper::Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    parts.extend(collect_element_text(child_el));
                }
            }
            _ => {}
        }
    }
    parts
}

/// Collapse runs of whitespace, keeping at most one blank line
fn clean_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_whitespace = false;
    let mut newline_count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push('\n');
            }
            prev_was_whitespace = true;
        } else if ch.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
            }
            prev_was_whitespace = true;
            newline_count = 0;
        } else {
            result.push(ch);
            prev_was_whitespace = false;
            newline_count = 0;
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_paragraphs_in_order() {
        let html = "<html><body><h1>Title</h1><p>First passage.</p><p>Second passage.</p></body></html>";
        let blocks = HtmlTextExtractor.extract(html);
        assert_eq!(blocks, vec!["Title", "First passage.", "Second passage."]);
    }

    #[test]
    fn test_skips_script_and_style() {
        let html = r#"<html><body>
            <p>Visible</p>
            <script>var hidden = 1;</script>
            <style>.h { display: none }</style>
        </body></html>"#;
        let blocks = HtmlTextExtractor.extract(html);
        assert_eq!(blocks, vec!["Visible"]);
    }

    #[test]
    fn test_nested_blocks_are_not_duplicated() {
        let html = "<body><blockquote>Outer <p>inner</p></blockquote></body>";
        let blocks = HtmlTextExtractor.extract(html);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("inner"));
    }

    #[test]
    fn test_markup_only_page_is_empty() {
        assert!(HtmlTextExtractor.extract("<svg><path d=\"M0 0\"/></svg>").is_empty());
        assert!(HtmlTextExtractor.extract("").is_empty());
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_whitespace("  hello   world  "), "hello world");
        assert_eq!(clean_whitespace("a\n\n\n\nb"), "a\n\nb");
    }
}
