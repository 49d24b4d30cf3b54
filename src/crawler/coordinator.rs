//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the top-level driver that:
//! - Decides between a crawl pass and a refresh-only run
//! - Resumes from a snapshot or seeds a fresh frontier
//! - Drains the frontier through the fetch pipeline, snapshotting as it goes
//! - Hands over to the refresh scanner once a pass completes

use crate::config::CrawlConfig;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::frontier::Frontier;
use crate::crawler::pipeline::{FetchPipeline, Outcome, SkipReason};
use crate::crawler::sitemap::SitemapIngestor;
use crate::extract::ContentExtractor;
use crate::refresh::{RefreshScanner, RefreshSummary};
use crate::robots::RobotsCache;
use crate::state::{FrontierEntry, SnapshotFile};
use crate::storage::DocumentStore;
use crate::url::{normalize, SourceRegistry};
use crate::{HarvestError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Tally of one crawl pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// The frontier came from a snapshot rather than seeding
    pub resumed: bool,
    /// Entries added while seeding (start URLs and sitemaps)
    pub seeded: usize,
    /// Entries taken off the frontier and run to completion
    pub processed: u64,
    /// Documents saved in this process
    pub saved: u64,
    pub skipped: u64,
    /// Links queued from saved pages
    pub links_enqueued: u64,
    /// Saved count including documents saved before a resume
    pub saved_total: u64,
    /// The frontier drained or the quota was reached
    pub completed: bool,
}

/// What one invocation of the orchestrator did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Absent when the store was already at quota
    pub crawl: Option<CrawlSummary>,
    /// Absent when the crawl pass was cancelled
    pub refresh: Option<RefreshSummary>,
    pub cancelled: bool,
}

/// Top-level crawl driver
pub struct Orchestrator<S: DocumentStore> {
    config: CrawlConfig,
    store: S,
    registry: Arc<SourceRegistry>,
    extractor: Arc<dyn ContentExtractor>,
    client: Client,
    snapshot: SnapshotFile,
}

impl<S: DocumentStore> Orchestrator<S> {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl policy
    /// * `store` - An opened document store
    /// * `registry` - The source table; every configured source must be in it
    /// * `extractor` - Content extraction capability
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(HarvestError::UnknownSource)` - A configured source is not in the registry
    pub fn new(
        config: CrawlConfig,
        store: S,
        registry: SourceRegistry,
        extractor: Arc<dyn ContentExtractor>,
    ) -> Result<Self> {
        if let Some(unknown) = config
            .sources
            .iter()
            .find(|source| registry.by_name(&source.name).is_none())
        {
            return Err(HarvestError::UnknownSource(unknown.name.clone()));
        }

        let client = build_http_client(&config.user_agent, config.request_timeout())?;
        let snapshot = SnapshotFile::new(&config.snapshot_path);

        Ok(Self {
            config,
            store,
            registry: Arc::new(registry),
            extractor,
            client,
            snapshot,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs a crawl pass (or only a refresh when the store is at quota)
    ///
    /// Cancellation stops the run between network operations. A document
    /// that was already stored is always counted in the snapshot; an entry
    /// interrupted before that stays queued for the next run.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary> {
        let stored = self.store.count_documents()?;
        if stored >= self.config.max_documents {
            tracing::info!(
                "Store holds {} documents (quota {}), skipping crawl",
                stored,
                self.config.max_documents
            );
            let refresh = self.refresh(cancel).await?;
            return Ok(RunSummary {
                crawl: None,
                refresh: Some(refresh),
                cancelled: cancel.is_cancelled(),
            });
        }

        let crawl = self.crawl(cancel).await?;
        if !crawl.completed {
            tracing::info!("Crawl interrupted, state kept in {}", self.snapshot.path().display());
            return Ok(RunSummary {
                crawl: Some(crawl),
                refresh: None,
                cancelled: true,
            });
        }

        self.snapshot.remove()?;
        let refresh = self.refresh(cancel).await?;

        Ok(RunSummary {
            crawl: Some(crawl),
            refresh: Some(refresh),
            cancelled: cancel.is_cancelled(),
        })
    }

    /// Drains the frontier until it is empty, the quota is reached or the
    /// token is cancelled
    async fn crawl(&mut self, cancel: &CancellationToken) -> Result<CrawlSummary> {
        let mut pipeline = FetchPipeline::new(
            self.client.clone(),
            RobotsCache::new(self.client.clone()),
            Arc::clone(&self.registry),
            Arc::clone(&self.extractor),
            &self.config.user_agent,
            self.config.max_documents,
        )
        .with_cancel(cancel.clone());

        let mut summary = CrawlSummary::default();
        let (mut frontier, mut saved) = match self.snapshot.load()? {
            Some(state) => {
                let (frontier, saved) = Frontier::restore(state);
                tracing::info!(
                    "Resuming crawl: {} URLs queued, {} documents saved",
                    frontier.len(),
                    saved
                );
                summary.resumed = true;
                (frontier, saved)
            }
            None => {
                let (frontier, seeded) = self.seed(&mut pipeline).await?;
                summary.seeded = seeded;
                self.snapshot.save(&frontier.snapshot(0))?;
                (frontier, 0)
            }
        };

        let max_documents = self.config.max_documents;
        let delay = self.config.delay();
        let start_time = Instant::now();

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if saved >= max_documents {
                tracing::info!("Reached {} saved documents", max_documents);
                summary.completed = true;
                break;
            }
            let Some(entry) = frontier.dequeue() else {
                tracing::info!("Frontier is empty, crawl pass complete");
                summary.completed = true;
                break;
            };

            tracing::debug!("Processing ({}/{}): {}", saved + 1, max_documents, entry.url);

            let outcome = pipeline
                .process(&entry, saved, &mut self.store, &mut frontier)
                .await;

            if outcome == Outcome::Interrupted {
                tracing::debug!("Interrupted before storing {}", entry.url);
                break;
            }

            summary.processed += 1;
            match &outcome {
                Outcome::Saved {
                    normalized_url,
                    discovered,
                } => {
                    saved += 1;
                    summary.saved += 1;
                    summary.links_enqueued += *discovered as u64;
                    tracing::info!(
                        "Saved ({}/{}) {} [+{} links, {} queued]",
                        saved,
                        max_documents,
                        normalized_url,
                        discovered,
                        frontier.len()
                    );
                }
                Outcome::Skipped(reason) => {
                    summary.skipped += 1;
                    log_skip(&entry, reason);
                }
                Outcome::Interrupted => {}
            }

            self.snapshot.save(&frontier.snapshot(saved))?;

            if outcome == Outcome::Skipped(SkipReason::RobotsDenied) {
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        summary.saved_total = saved;
        tracing::info!(
            "Crawl pass: {} processed, {} saved ({} total), {} skipped in {:?}",
            summary.processed,
            summary.saved,
            saved,
            summary.skipped,
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// Builds a fresh frontier from start URLs and sitemaps
    async fn seed(&mut self, pipeline: &mut FetchPipeline) -> Result<(Frontier, usize)> {
        let mut frontier = Frontier::new();
        let mut seeded = 0;

        for source in &self.config.sources {
            for raw in &source.start_urls {
                let url = match normalize(raw, None) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::warn!("Skipping start URL {}: {}", raw, e);
                        continue;
                    }
                };

                if !pipeline.robots_allowed(&url).await {
                    tracing::info!("Start URL {} disallowed by robots.txt", url);
                    continue;
                }

                if self.store.contains(url.as_str())? {
                    tracing::info!("Start URL {} already stored", url);
                    continue;
                }

                if frontier.enqueue(FrontierEntry::new(url.as_str(), source.name.as_str())) {
                    seeded += 1;
                }
            }
        }

        let ingestor = SitemapIngestor::new(self.client.clone());
        for source in self.config.sources.iter().filter(|s| s.use_sitemap) {
            let Some(plan) = self
                .registry
                .by_name(&source.name)
                .and_then(|profile| profile.sitemap.as_ref())
            else {
                tracing::warn!("Source {} has no sitemap plan, skipping", source.name);
                continue;
            };

            seeded += ingestor
                .seed_from_sitemap(
                    &mut frontier,
                    &self.registry,
                    &plan.index_url,
                    &source.name,
                    |child| plan.accepts(child),
                )
                .await;
        }

        tracing::info!("Seeded frontier with {} URLs", seeded);
        Ok((frontier, seeded))
    }

    async fn refresh(&mut self, cancel: &CancellationToken) -> Result<RefreshSummary> {
        let scanner = RefreshScanner::new(
            self.client.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.extractor),
            self.config.delay(),
            self.config.refresh_interval(),
        );
        scanner.run(&mut self.store, cancel).await
    }
}

fn log_skip(entry: &FrontierEntry, reason: &SkipReason) {
    match reason {
        SkipReason::Transport(_) | SkipReason::HttpStatus(_) | SkipReason::NotFound => {
            tracing::warn!("Skipped {}: {}", entry.url, reason)
        }
        SkipReason::AlreadyStored { .. } => tracing::debug!("Skipped {}: {}", entry.url, reason),
        _ => tracing::info!("Skipped {}: {}", entry.url, reason),
    }
}
