//! Per-URL unit of work
//!
//! One dequeued frontier entry goes through robots check, fetch, redirect
//! and duplicate checks, soft-404 detection, extraction, storage and link
//! discovery. Every failure is a typed skip; nothing here aborts a crawl.

use crate::crawler::fetcher::{fetch_url, FetchResult, FetchedPage};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{discover_links, is_soft_404};
use crate::extract::ContentExtractor;
use crate::robots::RobotsCache;
use crate::state::FrontierEntry;
use crate::storage::{Document, DocumentStore};
use crate::url::{normalize_parsed, SourceRegistry};
use chrono::Utc;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why an entry produced no document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The frontier held something that is not an absolute http(s) URL
    InvalidUrl(String),
    RobotsDenied,
    /// Connection, timeout or body read failure
    Transport(String),
    NotFound,
    /// Any status other than 200 and 404
    HttpStatus(u16),
    /// The final (post-redirect) URL is not an article of a known source
    Inadmissible(String),
    /// The final URL is already stored; `redirected` when it differs from the dequeued one
    AlreadyStored { url: String, redirected: bool },
    SoftNotFound,
    EmptyText,
    /// The store rejected a read or write for this entry
    Storage(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(e) => write!(f, "invalid URL ({})", e),
            Self::RobotsDenied => write!(f, "disallowed by robots.txt"),
            Self::Transport(e) => write!(f, "request failed ({})", e),
            Self::NotFound => write!(f, "HTTP 404"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Inadmissible(url) => write!(f, "redirected to inadmissible {}", url),
            Self::AlreadyStored { url, redirected: true } => {
                write!(f, "redirected to already stored {}", url)
            }
            Self::AlreadyStored { url, .. } => write!(f, "already stored as {}", url),
            Self::SoftNotFound => write!(f, "soft 404"),
            Self::EmptyText => write!(f, "no article text"),
            Self::Storage(e) => write!(f, "store error ({})", e),
        }
    }
}

/// Result of processing one frontier entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Saved {
        /// Normalized URL the document was stored under
        normalized_url: String,
        /// New frontier entries found on the page
        discovered: usize,
    },
    Skipped(SkipReason),
    /// Cancelled before anything was stored; the entry should be retried
    Interrupted,
}

impl Outcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// Fetch → validate → extract → store, for one URL at a time
pub struct FetchPipeline {
    client: Client,
    robots: RobotsCache,
    registry: Arc<SourceRegistry>,
    extractor: Arc<dyn ContentExtractor>,
    user_agent: String,
    max_documents: u64,
    cancel: CancellationToken,
}

impl FetchPipeline {
    pub fn new(
        client: Client,
        robots: RobotsCache,
        registry: Arc<SourceRegistry>,
        extractor: Arc<dyn ContentExtractor>,
        user_agent: &str,
        max_documents: u64,
    ) -> Self {
        Self {
            client,
            robots,
            registry,
            extractor,
            user_agent: user_agent.to_string(),
            max_documents,
            cancel: CancellationToken::new(),
        }
    }

    /// Lets `cancel` interrupt network waits
    ///
    /// Before the document is stored, cancellation yields
    /// `Outcome::Interrupted`. After it, link discovery stops early and the
    /// save is still reported.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Robots permission for `url`, through the pipeline's cache
    pub async fn robots_allowed(&mut self, url: &Url) -> bool {
        self.robots.is_allowed(url, &self.user_agent).await
    }

    /// Processes one dequeued entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The dequeued frontier entry
    /// * `saved_before` - Documents saved so far in this pass; links are only
    ///   discovered while the pass stays below quota after this save
    /// * `store` - The document store
    /// * `frontier` - Receives discovered links
    pub async fn process<S: DocumentStore>(
        &mut self,
        entry: &FrontierEntry,
        saved_before: u64,
        store: &mut S,
        frontier: &mut Frontier,
    ) -> Outcome {
        let url = match Url::parse(&entry.url) {
            Ok(url) => url,
            Err(e) => return Outcome::Skipped(SkipReason::InvalidUrl(e.to_string())),
        };

        let cancel = self.cancel.clone();
        let allowed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Interrupted,
            allowed = self.robots_allowed(&url) => allowed,
        };
        if !allowed {
            return Outcome::Skipped(SkipReason::RobotsDenied);
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Interrupted,
            fetched = fetch_url(&self.client, url.as_str()) => fetched,
        };
        let page = match fetched {
            FetchResult::Success(page) => page,
            FetchResult::NotFound => return Outcome::Skipped(SkipReason::NotFound),
            FetchResult::NotModified => return Outcome::Skipped(SkipReason::HttpStatus(304)),
            FetchResult::HttpError { status_code } => {
                return Outcome::Skipped(SkipReason::HttpStatus(status_code))
            }
            FetchResult::NetworkError { error } => {
                return Outcome::Skipped(SkipReason::Transport(error))
            }
        };

        let registry = Arc::clone(&self.registry);
        let final_url = match normalize_parsed(page.final_url.clone()) {
            Ok(final_url) if registry.is_admissible(&final_url) => final_url,
            _ => return Outcome::Skipped(SkipReason::Inadmissible(page.final_url.to_string())),
        };
        let Some(profile) = registry.source_of(&final_url) else {
            return Outcome::Skipped(SkipReason::Inadmissible(final_url.to_string()));
        };

        match store.contains(final_url.as_str()) {
            Ok(false) => {}
            Ok(true) => {
                return Outcome::Skipped(SkipReason::AlreadyStored {
                    url: final_url.to_string(),
                    redirected: final_url.as_str() != entry.url,
                })
            }
            Err(e) => return Outcome::Skipped(SkipReason::Storage(e.to_string())),
        }

        if is_soft_404(&page.body) {
            return Outcome::Skipped(SkipReason::SoftNotFound);
        }

        let extracted = self.extractor.extract(&page.body, profile);
        if !extracted.has_text() {
            return Outcome::Skipped(SkipReason::EmptyText);
        }

        let FetchedPage {
            final_url: raw_final_url,
            body,
            last_modified,
            etag,
        } = page;

        let now = Utc::now();
        let document = Document {
            original_url: entry.url.clone(),
            normalized_url: final_url.to_string(),
            html_content: body,
            clean_text: extracted.text,
            title: extracted.title,
            author: extracted.author,
            publish_date: extracted.publish_date,
            source: profile.name.clone(),
            fetched_at: now,
            last_modified,
            etag,
            last_fetch_attempt: now,
        };

        if let Err(e) = store.upsert_document(&document) {
            return Outcome::Skipped(SkipReason::Storage(e.to_string()));
        }

        let discovered = if saved_before + 1 < self.max_documents {
            self.enqueue_links(&document.html_content, &raw_final_url, store, frontier)
                .await
        } else {
            0
        };

        Outcome::Saved {
            normalized_url: document.normalized_url,
            discovered,
        }
    }

    /// Queues the page's article links that are neither queued nor stored
    /// and that robots.txt allows
    async fn enqueue_links<S: DocumentStore>(
        &mut self,
        html: &str,
        page_url: &Url,
        store: &S,
        frontier: &mut Frontier,
    ) -> usize {
        let registry = Arc::clone(&self.registry);
        let cancel = self.cancel.clone();
        let mut added = 0;

        for link in discover_links(html, page_url, &registry) {
            if frontier.contains(link.as_str()) {
                continue;
            }

            match store.contains(link.as_str()) {
                Ok(false) => {}
                Ok(true) => continue,
                Err(e) => {
                    tracing::warn!("Store lookup failed for {}: {}", link, e);
                    continue;
                }
            }

            let allowed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                allowed = self.robots_allowed(&link) => allowed,
            };
            if !allowed {
                tracing::debug!("Link {} disallowed by robots.txt", link);
                continue;
            }

            let source = registry.source_name(&link).to_string();
            if frontier.enqueue(FrontierEntry::new(link.as_str(), source)) {
                added += 1;
            }
        }

        added
    }
}
