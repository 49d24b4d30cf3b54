//! URL handling module
//!
//! This module provides URL normalization, domain extraction and the source
//! table that decides which URLs are crawlable articles.

mod domain;
mod matcher;
mod normalize;
mod source;

pub use domain::{domain_base, extract_domain, same_host};
pub use matcher::matches_domain;
pub use normalize::{normalize, normalize_parsed};
pub use source::{
    Admission, SitemapPlan, SourceProfile, SourceRegistry, UNKNOWN_SOURCE,
};
