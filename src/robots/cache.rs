//! Robots.txt cache entries
//!
//! A cached policy remembers when it was fetched so the cache can evict it
//! once it is older than the TTL.

use crate::robots::RobotsPolicy;
use chrono::{DateTime, Duration, Utc};

/// Cached robots.txt policy for a domain base
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The policy (or allow-all sentinel) in effect for the domain
    pub policy: RobotsPolicy,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn fetched_at(policy: RobotsPolicy, fetched_at: DateTime<Utc>) -> Self {
        Self { policy, fetched_at }
    }

    /// Checks if the entry is older than `ttl` at `now`
    pub fn is_stale_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at > ttl
    }

    /// Checks if a URL is allowed according to the cached policy
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.policy.is_allowed(url, user_agent)
    }
}
