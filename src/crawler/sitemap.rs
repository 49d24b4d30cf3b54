//! Sitemap ingestion
//!
//! Bulk-loads article URLs from a source's sitemap index into a fresh
//! frontier. Sitemap failures never abort a crawl: they are logged and yield
//! no URLs.

use crate::crawler::frontier::Frontier;
use crate::state::FrontierEntry;
use crate::url::{normalize, SourceRegistry};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, StatusCode};

/// Extracts every non-empty `<loc>` value from a sitemap or sitemap index
pub fn parse_locs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Event::Text(t) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"loc" => {
                if let Some(loc) = current.take() {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(locs)
}

/// Fetches sitemaps and feeds their URLs to the frontier
pub struct SitemapIngestor {
    client: Client,
}

impl SitemapIngestor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches one sitemap (or sitemap index) and returns its `<loc>` values
    ///
    /// Transport failures, non-200 statuses and malformed XML all yield an
    /// empty list.
    pub async fn load_sitemap_urls(&self, sitemap_url: &str) -> Vec<String> {
        let response = match self.client.get(sitemap_url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch sitemap {}: {}", sitemap_url, e);
                return Vec::new();
            }
        };

        if response.status() != StatusCode::OK {
            tracing::warn!("Sitemap {} returned HTTP {}", sitemap_url, response.status());
            return Vec::new();
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read sitemap {}: {}", sitemap_url, e);
                return Vec::new();
            }
        };

        match parse_locs(&body) {
            Ok(locs) => {
                tracing::debug!("Sitemap {} lists {} URLs", sitemap_url, locs.len());
                locs
            }
            Err(e) => {
                tracing::warn!("Malformed sitemap {}: {}", sitemap_url, e);
                Vec::new()
            }
        }
    }

    /// Seeds the frontier from a sitemap index
    ///
    /// Child sitemaps whose URL passes `predicate` are loaded; their URLs are
    /// normalized, filtered by admissibility and enqueued for `source` unless
    /// already queued.
    ///
    /// # Returns
    ///
    /// The number of entries added to the frontier
    pub async fn seed_from_sitemap<F>(
        &self,
        frontier: &mut Frontier,
        registry: &SourceRegistry,
        index_url: &str,
        source: &str,
        predicate: F,
    ) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let children = self.load_sitemap_urls(index_url).await;
        if children.is_empty() {
            tracing::warn!("Sitemap index {} yielded nothing for {}", index_url, source);
            return 0;
        }

        let mut added = 0;
        for child in children.iter().filter(|child| predicate(child)) {
            for loc in self.load_sitemap_urls(child).await {
                let url = match normalize(&loc, None) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::debug!("Skipping sitemap entry {}: {}", loc, e);
                        continue;
                    }
                };

                if !registry.is_admissible(&url) {
                    continue;
                }

                if frontier.enqueue(FrontierEntry::new(url.as_str(), source)) {
                    added += 1;
                }
            }
        }

        tracing::info!("Added {} URLs from the {} sitemap", added, source);
        added
    }
}
