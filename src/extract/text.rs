//! Text helpers shared by the extraction rules

use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as article content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "aside", "header"];

/// Collapses every whitespace run to a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the visible text under `root`, whitespace-collapsed
///
/// Text inside script, style, nav, footer, aside and header elements
/// (between `root` and the text node) is dropped.
pub fn visible_text(root: ElementRef<'_>) -> String {
    let mut raw = String::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root.id())
            .chain(std::iter::once(*root))
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|element| HIDDEN_ELEMENTS.contains(&element.name()));

        if !hidden {
            raw.push_str(text);
        }
    }

    collapse_whitespace(&raw)
}

/// First element matching `css`, if the selector parses and anything matches
pub fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Every element matching `css`
pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Trimmed text of the first element matching `css`, or an empty string
pub fn first_text(document: &Html, css: &str) -> String {
    select_first(document, css)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .unwrap_or_default()
}

/// Value of `attr` on the first element matching `css`, or an empty string
pub fn first_attr(document: &Html, css: &str, attr: &str) -> String {
    select_first(document, css)
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Keeps the date part of an ISO-8601 timestamp ("2024-03-01T10:00:00" → "2024-03-01")
pub fn date_part(timestamp: &str) -> String {
    timestamp
        .split('T')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
