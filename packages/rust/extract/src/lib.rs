//! Visible-text extraction from fetched company pages.

use scraper::{Html, Node, Selector};

/// Tags whose text content is never visible to a reader.
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Extract the visible text of the document body.
///
/// Runs of markup-driven whitespace collapse to single spaces. A document
/// without a `body` element yields an empty string — that is not an error;
/// the summarization stage decides what to do with empty content.
pub fn body_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let body_sel = Selector::parse("body").unwrap();

    let Some(body) = doc.select(&body_sel).next() else {
        return String::new();
    };

    let mut parts: Vec<&str> = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let parent_tag = node.parent().and_then(|p| match p.value() {
            Node::Element(el) => Some(el.name()),
            _ => None,
        });
        if parent_tag.is_some_and(|t| HIDDEN_TAGS.contains(&t)) {
            continue;
        }
        parts.push(&text.text);
    }

    parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
