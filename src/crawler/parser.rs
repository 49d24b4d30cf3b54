//! HTML inspection for the fetch pipeline
//!
//! This module handles:
//! - Soft-404 detection (HTTP 200 pages that say "not found")
//! - Link discovery: admissible, same-host article links found on a page

use crate::url::{normalize, same_host, SourceRegistry};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Case-insensitive phrases that mark a not-found page
const NOT_FOUND_MARKERS: &[&str] = &["404", "страница не найдена", "page not found"];

/// Pages with fewer words than this are judged by their whole text
const SHORT_PAGE_WORDS: usize = 10;

/// Raw href prefixes that are never followed
const SKIPPED_HREF_PREFIXES: &[&str] = &["#", "mailto:", "tel:", "javascript:"];

/// Site sections that never hold articles
const SKIPPED_PATH_PREFIXES: &[&str] = &["/tags", "/search", "/user", "/profile", "/comment"];

fn has_not_found_marker(text: &str) -> bool {
    let lowered = text.to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn first_element_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
}

/// Checks if a 200 response is really a "not found" page
///
/// # Detection Rules
///
/// - The `<title>` contains a marker
/// - The first `<h1>` contains a marker
/// - The page has fewer than ten words and its text contains a marker
pub fn is_soft_404(html: &str) -> bool {
    let document = Html::parse_document(html);

    if first_element_text(&document, "title").is_some_and(|t| has_not_found_marker(&t)) {
        return true;
    }

    if first_element_text(&document, "h1").is_some_and(|t| has_not_found_marker(&t)) {
        return true;
    }

    let body_text = document.root_element().text().collect::<Vec<_>>().join(" ");
    body_text.split_whitespace().count() < SHORT_PAGE_WORDS && has_not_found_marker(&body_text)
}

/// Finds the article links on a page worth queueing
///
/// # Link Rules
///
/// **Include:** `<a href>` targets that normalize cleanly, are admissible
/// for their source and live on the same host (and port) as the page.
///
/// **Exclude:**
/// - Fragment-only, `mailto:`, `tel:` and `javascript:` hrefs
/// - Paths under `/tags`, `/search`, `/user`, `/profile`, `/comment`
///
/// Links come back normalized, deduplicated, in document order.
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `page_url` - The (final) URL of the page, used to resolve relative links
/// * `registry` - The source table deciding admissibility
pub fn discover_links(html: &str, page_url: &Url, registry: &SourceRegistry) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let lowered = href.to_lowercase();

        if href.is_empty()
            || SKIPPED_HREF_PREFIXES.iter().any(|p| lowered.starts_with(p))
            || SKIPPED_PATH_PREFIXES.iter().any(|p| lowered.starts_with(p))
        {
            continue;
        }

        let link = match normalize(href, Some(page_url)) {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!("Skipping link {}: {}", href, e);
                continue;
            }
        };

        let path = link.path().to_lowercase();
        if SKIPPED_PATH_PREFIXES.iter().any(|p| path.starts_with(p)) {
            continue;
        }

        if !same_host(&link, page_url) || !registry.is_admissible(&link) {
            continue;
        }

        if seen.insert(link.as_str().to_string()) {
            links.push(link);
        }
    }

    links
}
