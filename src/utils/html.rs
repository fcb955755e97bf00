//! HTML fragment helpers.
//!
//! The portal embeds small HTML fragments inside JSON fields and serves
//! full pages for documents and assignments. These helpers flatten such
//! markup into whitespace-normalized plain text.

use scraper::{ElementRef, Html, Selector};

/// Collect the text of an element with runs of whitespace collapsed.
pub fn element_text(element: ElementRef) -> String {
    let raw: String = element.text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&raw)
}

/// Flatten an HTML fragment into plain text.
pub fn fragment_text(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    element_text(doc.root_element())
}

/// Text of the first element matching `selector` inside an HTML fragment.
/// `None` when the selector does not match; an invalid selector literal
/// also yields `None` so callers stay total.
pub fn select_text(fragment: &str, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let doc = Html::parse_fragment(fragment);
    doc.select(&sel).next().map(element_text)
}

/// Text of the first element matching `selector`, with line breaks removed
/// outright and the result trimmed. The portal wraps titles across source
/// lines mid-word, so the breaks are layout artifacts, not separators.
pub fn select_unwrapped_text(fragment: &str, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let doc = Html::parse_fragment(fragment);
    doc.select(&sel).next().map(|element| {
        element
            .text()
            .collect::<String>()
            .replace(['\n', '\r'], "")
            .trim()
            .to_string()
    })
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
