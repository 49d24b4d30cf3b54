//! Content fingerprints
//!
//! A fingerprint covers the fields a reader cares about, so markup churn and
//! reflowed whitespace do not count as a change.

use crate::extract::collapse_whitespace;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest over `title|author|publish_date|text`, with the text
/// whitespace-collapsed
pub fn fingerprint(title: &str, author: &str, publish_date: &str, text: &str) -> String {
    let combined = format!(
        "{}|{}|{}|{}",
        title,
        author,
        publish_date,
        collapse_whitespace(text)
    );
    hex::encode(Sha256::digest(combined.as_bytes()))
}
