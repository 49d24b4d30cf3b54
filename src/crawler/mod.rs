//! Crawler module for article harvesting
//!
//! This module contains the crawl pass, including:
//! - HTTP fetching with conditional request support
//! - Link discovery and soft-404 detection
//! - The resumable frontier and sitemap seeding
//! - Per-URL processing and overall orchestration

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod pipeline;
mod sitemap;

pub use coordinator::{CrawlSummary, Orchestrator, RunSummary};
pub use fetcher::{
    build_http_client, fetch_conditional, fetch_url, FetchResult, FetchedPage, Validators,
};
pub use frontier::Frontier;
pub use parser::{discover_links, is_soft_404};
pub use pipeline::{FetchPipeline, Outcome, SkipReason};
pub use sitemap::{parse_locs, SitemapIngestor};
