//! JSON-LD (schema.org Article) metadata
//!
//! Malformed blocks are ignored; callers fall back to per-source rules.

use crate::extract::text::{date_part, select_all};
use scraper::Html;
use serde_json::Value;

/// Article fields found in the page's JSON-LD blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonLdArticle {
    pub body: String,
    pub headline: String,
    pub author: String,
    pub date_published: String,
}

impl JsonLdArticle {
    /// Collects the first non-empty value of each field across all blocks
    pub fn from_document(document: &Html) -> Self {
        let mut article = Self::default();

        for script in select_all(document, r#"script[type="application/ld+json"]"#) {
            let raw = script.text().collect::<String>();
            let value: Value = match serde_json::from_str(raw.trim()) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!("Ignoring malformed JSON-LD block: {}", e);
                    continue;
                }
            };

            for object in candidate_objects(&value) {
                article.absorb(object);
            }
        }

        article
    }

    fn absorb(&mut self, object: &Value) {
        fill(&mut self.body, string_field(object, "articleBody"));
        fill(&mut self.headline, string_field(object, "headline"));
        fill(&mut self.author, author_name(object.get("author")));
        fill(
            &mut self.date_published,
            string_field(object, "datePublished").map(|d| date_part(&d)),
        );
    }
}

/// Top-level objects, array members and `@graph` members
fn candidate_objects(value: &Value) -> Vec<&Value> {
    let mut objects = Vec::new();
    match value {
        Value::Object(map) => {
            objects.push(value);
            if let Some(Value::Array(graph)) = map.get("@graph") {
                objects.extend(graph.iter().filter(|v| v.is_object()));
            }
        }
        Value::Array(items) => objects.extend(items.iter().filter(|v| v.is_object())),
        _ => {}
    }
    objects
}

fn string_field(object: &Value, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `author` may be a string, an object with `name`, or a list of either
fn author_name(author: Option<&Value>) -> Option<String> {
    match author? {
        Value::String(name) => Some(name.trim().to_string()).filter(|s| !s.is_empty()),
        object @ Value::Object(_) => string_field(object, "name"),
        Value::Array(items) => items.iter().find_map(|item| author_name(Some(item))),
        _ => None,
    }
}

fn fill(slot: &mut String, candidate: Option<String>) {
    if slot.is_empty() {
        if let Some(value) = candidate {
            *slot = value;
        }
    }
}
