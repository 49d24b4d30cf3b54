//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. The cache is an explicitly owned component: whoever
//! needs fetch permission borrows it.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::RobotsPolicy;

use crate::url::domain_base;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use url::Url;

/// How long a fetched robots.txt (or a failed fetch) is trusted
pub const ROBOTS_TTL_HOURS: i64 = 24;

/// Per-domain robots.txt cache with lazy TTL eviction
pub struct RobotsCache {
    client: Client,
    ttl: Duration,
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            ttl: Duration::hours(ROBOTS_TTL_HOURS),
            entries: HashMap::new(),
        }
    }

    /// Checks if `url` may be fetched by `user_agent`
    ///
    /// The first query for a domain base fetches and caches its robots.txt.
    /// A failed fetch caches an allow-all sentinel, so it is not retried
    /// until the TTL elapses.
    pub async fn is_allowed(&mut self, url: &Url, user_agent: &str) -> bool {
        self.is_allowed_at(url, user_agent, Utc::now()).await
    }

    /// Same as `is_allowed`, evaluated at a given instant
    pub async fn is_allowed_at(&mut self, url: &Url, user_agent: &str, now: DateTime<Utc>) -> bool {
        let Some(base) = domain_base(url) else {
            return false;
        };

        if self
            .entries
            .get(&base)
            .is_some_and(|entry| entry.is_stale_at(now, self.ttl))
        {
            tracing::debug!("robots.txt for {} expired, evicting", base);
            self.entries.remove(&base);
        }

        if !self.entries.contains_key(&base) {
            tracing::debug!("Fetching robots.txt for {}", base);
            let policy = fetch_robots(&self.client, &base).await;
            self.entries
                .insert(base.clone(), CachedRobots::fetched_at(policy, now));
        }

        self.entries
            .get(&base)
            .map_or(true, |entry| entry.is_allowed(url.as_str(), user_agent))
    }

    /// Number of cached domain bases
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches robots.txt for a domain base (`scheme://host[:port]`)
///
/// Never fails: transport errors and unexpected statuses degrade to
/// `RobotsPolicy::AllowAll`; 401/403 mean `RobotsPolicy::DisallowAll`.
pub async fn fetch_robots(client: &Client, base: &str) -> RobotsPolicy {
    let robots_url = format!("{}/robots.txt", base);

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}; allowing all", robots_url, e);
            return RobotsPolicy::AllowAll;
        }
    };

    match response.status() {
        status if status.is_success() => match response.text().await {
            Ok(body) => RobotsPolicy::from_content(&body),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}; allowing all", robots_url, e);
                RobotsPolicy::AllowAll
            }
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::info!("{} is access-restricted; disallowing all", robots_url);
            RobotsPolicy::DisallowAll
        }
        status => {
            tracing::debug!("{} returned HTTP {}; allowing all", robots_url, status);
            RobotsPolicy::AllowAll
        }
    }
}
