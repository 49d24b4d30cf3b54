//! Refresh scanner
//!
//! Re-validates stored documents whose last fetch attempt is older than the
//! refresh interval, in batches of the oldest attempts first. Conditional
//! requests and content fingerprints keep unchanged documents from being
//! rewritten. Every candidate gets its last-fetch-attempt stamped, so the
//! scan always runs out of candidates.

mod fingerprint;

pub use fingerprint::fingerprint;

use crate::crawler::{fetch_conditional, is_soft_404, FetchResult, FetchedPage, Validators};
use crate::extract::ContentExtractor;
use crate::storage::{Document, DocumentStore};
use crate::url::{normalize_parsed, SourceRegistry};
use crate::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Documents re-checked per store query
pub const REFRESH_BATCH_SIZE: usize = 100;

/// Tally of one refresh pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub batches: u64,
    /// Candidates that were re-checked (fetched or attempted)
    pub checked: u64,
    /// Candidates rewritten with new content
    pub updated: u64,
    /// Candidates confirmed unchanged (304 or equal fingerprint)
    pub unchanged: u64,
}

/// What happened to one refresh candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Revalidation {
    Updated,
    Unchanged,
    /// Fetch failed or the result was unusable; only the attempt was recorded
    Touched,
}

pub struct RefreshScanner {
    client: Client,
    registry: Arc<SourceRegistry>,
    extractor: Arc<dyn ContentExtractor>,
    delay: Duration,
    interval: chrono::Duration,
}

impl RefreshScanner {
    pub fn new(
        client: Client,
        registry: Arc<SourceRegistry>,
        extractor: Arc<dyn ContentExtractor>,
        delay: Duration,
        interval: chrono::Duration,
    ) -> Self {
        Self {
            client,
            registry,
            extractor,
            delay,
            interval,
        }
    }

    /// Re-checks stale documents until none are left or the token is cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(RefreshSummary)` - Pass finished (or was cancelled)
    /// * `Err(HarvestError::Storage)` - A store read or write failed
    pub async fn run<S: DocumentStore>(
        &self,
        store: &mut S,
        cancel: &CancellationToken,
    ) -> Result<RefreshSummary> {
        let mut summary = RefreshSummary::default();

        'batches: loop {
            let cutoff = Utc::now() - self.interval;
            let batch = store.stale_documents(cutoff, REFRESH_BATCH_SIZE)?;
            if batch.is_empty() {
                break;
            }

            summary.batches += 1;
            tracing::info!("Refresh batch {}: {} documents", summary.batches, batch.len());

            for document in batch {
                if cancel.is_cancelled() {
                    break 'batches;
                }

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break 'batches,
                    result = self.revalidate(store, &document) => result,
                };

                summary.checked += 1;
                match result? {
                    Revalidation::Updated => summary.updated += 1,
                    Revalidation::Unchanged => summary.unchanged += 1,
                    Revalidation::Touched => {}
                }

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break 'batches,
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        tracing::info!(
            "Refresh pass: {} checked, {} updated, {} unchanged in {} batches",
            summary.checked,
            summary.updated,
            summary.unchanged,
            summary.batches
        );

        Ok(summary)
    }

    async fn revalidate<S: DocumentStore>(
        &self,
        store: &mut S,
        document: &Document,
    ) -> Result<Revalidation> {
        let validators = Validators {
            last_modified: document.last_modified.as_deref(),
            etag: document.etag.as_deref(),
        };
        let fetched = fetch_conditional(&self.client, &document.original_url, validators).await;
        let now = Utc::now();

        let page = match fetched {
            FetchResult::Success(page) => page,
            FetchResult::NotModified => {
                tracing::info!("Unchanged (304): {}", document.normalized_url);
                store.touch_fetch_attempt(&document.normalized_url, now)?;
                return Ok(Revalidation::Unchanged);
            }
            FetchResult::NotFound => {
                tracing::warn!("Refresh of {} returned HTTP 404", document.normalized_url);
                return self.touch(store, document, now);
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!(
                    "Refresh of {} returned HTTP {}",
                    document.normalized_url,
                    status_code
                );
                return self.touch(store, document, now);
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Refresh of {} failed: {}", document.normalized_url, error);
                return self.touch(store, document, now);
            }
        };

        self.apply(store, document, page, now)
    }

    /// Compares a fresh 200 response with the stored document
    fn apply<S: DocumentStore>(
        &self,
        store: &mut S,
        document: &Document,
        page: FetchedPage,
        now: DateTime<Utc>,
    ) -> Result<Revalidation> {
        let final_url = match normalize_parsed(page.final_url.clone()) {
            Ok(url) if self.registry.is_admissible(&url) => url,
            _ => {
                tracing::info!(
                    "Refresh of {} redirected to inadmissible {}",
                    document.normalized_url,
                    page.final_url
                );
                return self.touch(store, document, now);
            }
        };
        let Some(profile) = self.registry.source_of(&final_url) else {
            return self.touch(store, document, now);
        };

        if final_url.as_str() != document.normalized_url && store.contains(final_url.as_str())? {
            tracing::info!(
                "Refresh of {} redirected to already stored {}",
                document.normalized_url,
                final_url
            );
            return self.touch(store, document, now);
        }

        if is_soft_404(&page.body) {
            tracing::warn!("Refresh of {} now looks like a 404 page", document.normalized_url);
            return self.touch(store, document, now);
        }

        let extracted = self.extractor.extract(&page.body, profile);
        if !extracted.has_text() {
            tracing::warn!("Refresh of {} yielded no article text", document.normalized_url);
            return self.touch(store, document, now);
        }

        let before = fingerprint(
            &document.title,
            &document.author,
            &document.publish_date,
            &document.clean_text,
        );
        let after = fingerprint(
            &extracted.title,
            &extracted.author,
            &extracted.publish_date,
            &extracted.text,
        );

        if before == after {
            tracing::info!("Unchanged: {}", document.normalized_url);
            store.touch_fetch_attempt(&document.normalized_url, now)?;
            return Ok(Revalidation::Unchanged);
        }

        let updated = Document {
            original_url: document.original_url.clone(),
            normalized_url: final_url.to_string(),
            html_content: page.body,
            clean_text: extracted.text,
            title: extracted.title,
            author: extracted.author,
            publish_date: extracted.publish_date,
            source: profile.name.clone(),
            fetched_at: now,
            last_modified: page.last_modified,
            etag: page.etag,
            last_fetch_attempt: now,
        };
        store.replace_document(&document.normalized_url, &updated)?;
        tracing::info!("Updated: {}", document.normalized_url);

        Ok(Revalidation::Updated)
    }

    fn touch<S: DocumentStore>(
        &self,
        store: &mut S,
        document: &Document,
        now: DateTime<Utc>,
    ) -> Result<Revalidation> {
        store.touch_fetch_attempt(&document.normalized_url, now)?;
        Ok(Revalidation::Touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::build_http_client;
    use crate::extract::{ExtractorKind, RuleExtractor};
    use crate::storage::SqliteStore;
    use crate::url::{Admission, SourceProfile};
    use chrono::Duration as ChronoDuration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scanner() -> RefreshScanner {
        let registry = SourceRegistry::new(vec![SourceProfile::new(
            "local",
            "127.0.0.1",
            Admission::path_prefix("/articles/"),
            ExtractorKind::Generic,
        )]);
        RefreshScanner::new(
            build_http_client("TestBot/1.0", Duration::from_secs(5)).unwrap(),
            Arc::new(registry),
            Arc::new(RuleExtractor::new()),
            Duration::ZERO,
            ChronoDuration::days(7),
        )
    }

    fn stale_document(url: &str, text: &str) -> Document {
        let old = Utc::now() - ChronoDuration::days(8);
        Document {
            original_url: url.to_string(),
            normalized_url: url.to_string(),
            html_content: String::new(),
            clean_text: text.to_string(),
            title: String::new(),
            author: String::new(),
            publish_date: String::new(),
            source: "local".to_string(),
            fetched_at: old,
            last_modified: None,
            etag: Some("\"v1\"".to_string()),
            last_fetch_attempt: old,
        }
    }

    #[tokio::test]
    async fn test_not_modified_touches_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articles/a"))
            .and(header("If-None-Match", "\"v1\""))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/articles/a", server.uri());
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(&url, "old text")).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.updated, 0);
        let stored = store.get_document(&url).unwrap().unwrap();
        assert_eq!(stored.clean_text, "old text");
        assert!(stored.last_fetch_attempt > Utc::now() - ChronoDuration::minutes(1));
    }

    #[tokio::test]
    async fn test_changed_content_is_rewritten() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articles/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>brand new text</p></body></html>")
                    .insert_header("ETag", "\"v2\""),
            )
            .mount(&server)
            .await;

        let url = format!("{}/articles/a", server.uri());
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(&url, "old text")).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.updated, 1);
        let stored = store.get_document(&url).unwrap().unwrap();
        assert_eq!(stored.clean_text, "brand new text");
        assert_eq!(stored.etag.as_deref(), Some("\"v2\""));
    }

    #[tokio::test]
    async fn test_whitespace_only_change_is_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articles/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>same   text\n here</p></body></html>"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/articles/a", server.uri());
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(&url, "same text here")).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.updated, 0);
    }

    #[tokio::test]
    async fn test_transport_error_touches_and_terminates() {
        let url = "http://127.0.0.1:9/articles/a";
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(url, "old text")).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.batches, 1);
        let stored = store.get_document(url).unwrap().unwrap();
        assert_eq!(stored.clean_text, "old text");
        assert!(store
            .stale_documents(Utc::now() - ChronoDuration::days(7), 10)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_fresh_documents_are_not_checked() {
        let url = "http://127.0.0.1:9/articles/a";
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut document = stale_document(url, "text");
        document.last_fetch_attempt = Utc::now() - ChronoDuration::days(1);
        store.upsert_document(&document).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();
        assert_eq!(summary, RefreshSummary::default());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let url = "http://127.0.0.1:9/articles/a";
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(url, "text")).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = scanner().run(&mut store, &cancel).await.unwrap();

        assert_eq!(summary.checked, 0);
        assert_eq!(store.stale_documents(Utc::now(), 10).unwrap().len(), 1);
    }

    fn assert_touched_only(store: &SqliteStore, url: &str, text: &str) {
        let stored = store.get_document(url).unwrap().unwrap();
        assert_eq!(stored.clean_text, text);
        assert_eq!(stored.etag.as_deref(), Some("\"v1\""));
        assert!(stored.last_fetch_attempt > Utc::now() - ChronoDuration::minutes(1));
    }

    async fn redirect(server: &MockServer, from: &str, to: &str) {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", to))
            .mount(server)
            .await;
    }

    async fn serve_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_server_error_touches_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articles/a"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/articles/a", server.uri());
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(&url, "old text")).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.unchanged, 0);
        assert_touched_only(&store, &url, "old text");
    }

    #[tokio::test]
    async fn test_redirect_to_inadmissible_touches_only() {
        let server = MockServer::start().await;
        redirect(&server, "/articles/a", "/about").await;
        serve_page(&server, "/about", "<html><body><p>About us</p></body></html>").await;

        let url = format!("{}/articles/a", server.uri());
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(&url, "old text")).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.updated, 0);
        assert_touched_only(&store, &url, "old text");
        assert!(!store.contains(&format!("{}/about", server.uri())).unwrap());
    }

    #[tokio::test]
    async fn test_redirect_onto_other_stored_document_touches_only() {
        let server = MockServer::start().await;
        redirect(&server, "/articles/a", "/articles/b").await;
        serve_page(&server, "/articles/b", "<html><body><p>text of b</p></body></html>").await;

        let url_a = format!("{}/articles/a", server.uri());
        let url_b = format!("{}/articles/b", server.uri());
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(&url_a, "text of a")).unwrap();
        let mut b = stale_document(&url_b, "text of b");
        b.last_fetch_attempt = Utc::now() - ChronoDuration::days(1);
        store.upsert_document(&b).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(store.count_documents().unwrap(), 2);
        assert_touched_only(&store, &url_a, "text of a");
        let stored_b = store.get_document(&url_b).unwrap().unwrap();
        assert_eq!(stored_b.clean_text, "text of b");
        assert_eq!(stored_b.original_url, url_b);
        assert_eq!(stored_b.last_fetch_attempt.timestamp(), b.last_fetch_attempt.timestamp());
    }

    #[tokio::test]
    async fn test_soft_404_touches_only() {
        let server = MockServer::start().await;
        serve_page(
            &server,
            "/articles/a",
            "<html><head><title>Страница не найдена</title></head><body><p>Увы</p></body></html>",
        )
        .await;

        let url = format!("{}/articles/a", server.uri());
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(&url, "old text")).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.updated, 0);
        assert_touched_only(&store, &url, "old text");
    }

    #[tokio::test]
    async fn test_update_moves_row_to_new_normalized_url() {
        let server = MockServer::start().await;
        redirect(&server, "/articles/a", "/articles/moved").await;
        serve_page(&server, "/articles/moved", "<html><body><p>moved text</p></body></html>").await;

        let url = format!("{}/articles/a", server.uri());
        let moved = format!("{}/articles/moved", server.uri());
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_document(&stale_document(&url, "old text")).unwrap();

        let summary = scanner().run(&mut store, &CancellationToken::new()).await.unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(store.count_documents().unwrap(), 1);
        assert!(store.get_document(&url).unwrap().is_none());
        let stored = store.get_document(&moved).unwrap().unwrap();
        assert_eq!(stored.clean_text, "moved text");
        assert_eq!(stored.original_url, url);
        assert_eq!(stored.source, "local");
    }
}
