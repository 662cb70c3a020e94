//! Plain-text extraction
//!
//! Every non-blank text node under the root becomes one line, trimmed, in
//! document order. `script` and `style` subtrees are skipped entirely.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};

const STRIPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Extract newline-separated text from `root`.
#[must_use]
pub fn extract_text(root: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    collect_text(*root, &mut lines);
    lines.join("\n")
}

fn collect_text<'a>(node: NodeRef<'a, Node>, lines: &mut Vec<&'a str>) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed);
                }
            }
            Node::Element(element) if STRIPPED_ELEMENTS.contains(&element.name()) => {}
            Node::Element(_) => collect_text(child, lines),
            _ => {}
        }
    }
}
