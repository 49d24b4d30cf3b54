//! Article Harvester: an incremental, polite article crawler
//!
//! This crate harvests articles from a fixed set of content sites into a
//! document store and keeps that store fresh. It respects robots.txt, keeps a
//! resumable crawl frontier, and re-validates stale documents with
//! conditional requests and content fingerprints.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod refresh;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Unknown source '{0}': not present in the source registry")]
    UnknownSource(String),

    #[error("Malformed crawl snapshot: {0}")]
    SnapshotFormat(#[from] serde_json::Error),

    #[error("Unsupported crawl snapshot version {found} (expected {expected})")]
    SnapshotVersion { found: u64, expected: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlSummary, Orchestrator, RunSummary};
pub use extract::{ContentExtractor, Extracted, RuleExtractor};
pub use refresh::{RefreshScanner, RefreshSummary};
pub use storage::{Document, DocumentStore, SqliteStore};
pub use url::{normalize, SourceProfile, SourceRegistry};
