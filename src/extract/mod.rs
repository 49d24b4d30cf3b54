//! Article content extraction
//!
//! Extraction is a pure function of the raw page and the source profile the
//! page belongs to. JSON-LD metadata is consulted first; per-source selector
//! rules fill whatever it leaves empty.

mod date;
mod jsonld;
mod rules;
mod text;

pub use date::parse_russian_date;
pub use jsonld::JsonLdArticle;
pub use text::{collapse_whitespace, visible_text};

use crate::url::SourceProfile;
use scraper::Html;

/// Which selector rules apply to a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// 7ya.ru
    Semya,
    /// mama.ru
    Mama,
    /// letidor.ru
    Letidor,
    /// Whole-page text, for sources without dedicated rules
    Generic,
}

/// Fields pulled out of one article page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Clean article text
    pub text: String,
    pub title: String,
    pub author: String,
    /// Publication date, usually YYYY-MM-DD
    pub publish_date: String,
}

impl Extracted {
    /// Whether the page yielded any article text
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Pluggable extraction capability
///
/// Implementations must not perform I/O; the crawler calls them with the
/// body it already downloaded.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, html: &str, profile: &SourceProfile) -> Extracted;
}

/// Default extractor: JSON-LD first, then the profile's selector rules
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExtractor;

impl RuleExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ContentExtractor for RuleExtractor {
    fn extract(&self, html: &str, profile: &SourceProfile) -> Extracted {
        let document = Html::parse_document(html);
        let json_ld = JsonLdArticle::from_document(&document);

        let by_rules = match profile.extractor {
            ExtractorKind::Semya => rules::semya(&document),
            ExtractorKind::Mama => rules::mama(&document),
            ExtractorKind::Letidor => rules::letidor(&document),
            ExtractorKind::Generic => rules::generic(&document),
        };

        Extracted {
            text: prefer(json_ld.body, by_rules.text),
            title: prefer(json_ld.headline, by_rules.title),
            author: prefer(json_ld.author, by_rules.author),
            publish_date: prefer(json_ld.date_published, by_rules.publish_date),
        }
    }
}

fn prefer(primary: String, fallback: String) -> String {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}
