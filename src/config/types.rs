use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub crawl: CrawlConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Crawl policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// User-Agent header sent with every request and matched against robots.txt
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Pause between successive requests (seconds)
    #[serde(rename = "delay-seconds")]
    pub delay_seconds: f64,

    /// Number of documents to save before a crawl pass stops
    #[serde(rename = "max-documents")]
    pub max_documents: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Age of the last fetch attempt after which a document is re-checked (days)
    #[serde(
        rename = "refresh-interval-days",
        default = "default_refresh_interval"
    )]
    pub refresh_interval_days: u64,

    /// Where the resumable crawl snapshot is kept
    #[serde(rename = "snapshot-path", default = "default_snapshot_path")]
    pub snapshot_path: String,

    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

/// Upper bound accepted for `delay-seconds`
pub const MAX_DELAY_SECONDS: f64 = 3600.0;

/// Upper bound accepted for `refresh-interval-days`
pub const MAX_REFRESH_INTERVAL_DAYS: u64 = 3650;

impl CrawlConfig {
    /// Politeness delay as a `Duration`, clamped to the accepted range
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds.clamp(0.0, MAX_DELAY_SECONDS))
            .unwrap_or(Duration::ZERO)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_interval(&self) -> chrono::Duration {
        let days = self.refresh_interval_days.min(MAX_REFRESH_INTERVAL_DAYS);
        chrono::Duration::days(i64::try_from(days).unwrap_or(1))
    }
}

/// A configured source with its seed URLs
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Source identifier, must match a known source profile (e.g. "mama.ru")
    pub name: String,

    /// Seed URLs for a fresh crawl
    #[serde(rename = "start-urls", default)]
    pub start_urls: Vec<String>,

    /// Bulk-seed the frontier from the source's sitemap index
    #[serde(rename = "use-sitemap", default)]
    pub use_sitemap: bool,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_refresh_interval() -> u64 {
    7
}

fn default_snapshot_path() -> String {
    "crawler_state.json".to_string()
}
