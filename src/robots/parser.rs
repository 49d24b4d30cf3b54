//! Robots.txt policy implementation
//!
//! This module wraps the robotstxt crate's matcher behind a small policy type
//! that also covers the allow-all and disallow-all outcomes of a fetch.

use robotstxt::DefaultMatcher;

/// Fetch permission for one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsPolicy {
    /// Raw robots.txt content, matched on demand
    Rules(String),
    /// Sentinel used when robots.txt is missing or could not be fetched
    AllowAll,
    /// The server refused access to robots.txt itself (401/403)
    DisallowAll,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self::Rules(content.to_string())
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The full User-Agent string; only its product token is matched
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::DisallowAll => false,
            Self::Rules(content) if content.trim().is_empty() => true,
            Self::Rules(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, product_token(user_agent), url)
            }
        }
    }
}

/// Extracts the product token robots.txt groups are matched against
///
/// "ArticleHarvester/1.0 (+https://example.org)" becomes "ArticleHarvester".
fn product_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(trimmed.len());
    if end == 0 {
        trimmed
    } else {
        &trimmed[..end]
    }
}
