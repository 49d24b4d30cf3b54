//! Per-source selector rules
//!
//! Each source gets one function returning body text plus title, author and
//! publish date. Missing elements yield empty strings.

use crate::extract::date::parse_russian_date;
use crate::extract::text::{collapse_whitespace, date_part, first_attr, first_text, select_all, select_first, visible_text};
use crate::extract::Extracted;
use scraper::Html;

pub fn semya(document: &Html) -> Extracted {
    Extracted {
        text: select_first(document, ".articlebody")
            .map(visible_text)
            .unwrap_or_default(),
        title: first_text(document, r#"h1[itemprop="headline"]"#),
        author: first_text(document, r#"div.type a[href*="club.7ya.ru"]"#),
        publish_date: date_part(&first_attr(
            document,
            r#"meta[itemprop="datePublished"]"#,
            "content",
        )),
    }
}

/// mama.ru splits an article into a lead paragraph and the main block
pub fn mama(document: &Html) -> Extracted {
    let lead = first_text(document, ".article-lead--text.mt-2 p");
    let main = select_first(document, ".article-block")
        .map(visible_text)
        .unwrap_or_default();

    Extracted {
        text: collapse_whitespace(&format!("{} {}", lead, main)),
        title: first_text(document, r#"h1[itemprop="headline"]"#),
        author: first_text(document, "h5.fw-semibold.small-text-on-mobile"),
        publish_date: date_part(&first_attr(
            document,
            r#"meta[itemprop="datePublished"]"#,
            "content",
        )),
    }
}

/// letidor.ru spreads the body over several text blocks and prints the
/// date in Russian long form
pub fn letidor(document: &Html) -> Extracted {
    let text = select_all(document, r#"div[data-qa="text"]"#)
        .into_iter()
        .map(visible_text)
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let publish_date = select_first(document, "div.J57431KZ.M7gu8GJc")
        .and_then(|div| parse_russian_date(&div.text().collect::<String>()))
        .unwrap_or_default();

    Extracted {
        text,
        title: first_text(document, r#"h1[data-qa="lb-topic-header-texts-title"]"#),
        author: first_text(document, "div.jsx-1196406913 a.link"),
        publish_date,
    }
}

/// Whole-page visible text; metadata comes from JSON-LD only
pub fn generic(document: &Html) -> Extracted {
    Extracted {
        text: visible_text(document.root_element()),
        ..Extracted::default()
    }
}
