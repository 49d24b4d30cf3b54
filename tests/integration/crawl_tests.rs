//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for a content site and drive full
//! orchestrator runs: seeding, crawling, resuming and refreshing.

use article_harvester::config::{CrawlConfig, SourceEntry};
use article_harvester::crawler::Frontier;
use article_harvester::extract::{ContentExtractor, Extracted, ExtractorKind};
use article_harvester::state::{FrontierEntry, SnapshotFile};
use article_harvester::storage::{open_store, Document, DocumentStore, SqliteStore};
use article_harvester::url::{Admission, SitemapPlan, SourceProfile, SourceRegistry};
use article_harvester::{Orchestrator, RuleExtractor};
use chrono::{Duration, Utc};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a crawl configuration for the local test source
fn create_test_config(
    start_urls: Vec<String>,
    use_sitemap: bool,
    max_documents: u64,
    snapshot_path: &Path,
) -> CrawlConfig {
    CrawlConfig {
        user_agent: "TestBot/1.0".to_string(),
        delay_seconds: 0.0,
        max_documents,
        request_timeout_secs: 5,
        refresh_interval_days: 7,
        snapshot_path: snapshot_path.display().to_string(),
        sources: vec![SourceEntry {
            name: "local".to_string(),
            start_urls,
            use_sitemap,
        }],
    }
}

/// Registry whose only source is the mock server, admitting `/articles/` paths
fn local_registry(sitemap: Option<SitemapPlan>) -> SourceRegistry {
    let profile = SourceProfile::new(
        "local",
        "127.0.0.1",
        Admission::path_prefix("/articles/"),
        ExtractorKind::Generic,
    );
    let profile = match sitemap {
        Some(plan) => profile.with_sitemap(plan),
        None => profile,
    };
    SourceRegistry::new(vec![profile])
}

fn orchestrator(
    config: CrawlConfig,
    store: SqliteStore,
    registry: SourceRegistry,
) -> Orchestrator<SqliteStore> {
    Orchestrator::new(config, store, registry, Arc::new(RuleExtractor::new()))
        .expect("Failed to create orchestrator")
}

fn article(text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">more</a>"#, href))
        .collect();
    format!(
        "<html><head><title>Article</title></head><body><p>{}</p>{}</body></html>",
        text, anchors
    )
}

async fn serve(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn serve_never(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

fn stale_document(url: &str, text: &str) -> Document {
    let old = Utc::now() - Duration::days(30);
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
        etag: None,
        last_fetch_attempt: old,
    }
}

#[tokio::test]
async fn test_full_crawl_follows_article_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("crawler_state.json");

    serve(&server, "/robots.txt", 404, String::new()).await;
    serve(
        &server,
        "/articles/a",
        200,
        article("First article text", &["/articles/b", "/tags/x", "/about"]),
    )
    .await;
    serve(
        &server,
        "/articles/b",
        200,
        article("Second article text", &["/articles/a"]),
    )
    .await;

    let store = open_store(&dir.path().join("articles.db")).unwrap();
    let config = create_test_config(vec![format!("{}/articles/a", base)], false, 10, &snapshot_path);
    let mut orchestrator = orchestrator(config, store, local_registry(None));

    let summary = orchestrator.run(&CancellationToken::new()).await.unwrap();

    let crawl = summary.crawl.expect("crawl pass should run");
    assert!(crawl.completed);
    assert!(!crawl.resumed);
    assert_eq!(crawl.seeded, 1);
    assert_eq!(crawl.saved, 2);
    assert_eq!(crawl.links_enqueued, 1);
    assert_eq!(crawl.skipped, 0);
    assert!(!summary.cancelled);

    let refresh = summary.refresh.expect("refresh should follow a completed pass");
    assert_eq!(refresh.checked, 0);

    let store = orchestrator.store();
    assert_eq!(store.count_documents().unwrap(), 2);
    let first = store
        .get_document(&format!("{}/articles/a", base))
        .unwrap()
        .unwrap();
    assert_eq!(first.source, "local");
    assert!(first.clean_text.contains("First article text"));
    assert!(!snapshot_path.exists(), "snapshot should be removed after a completed pass");
}

#[tokio::test]
async fn test_quota_stops_crawl_and_link_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    serve(&server, "/robots.txt", 404, String::new()).await;
    serve(&server, "/articles/a", 200, article("Only one", &["/articles/b"])).await;
    serve_never(&server, "/articles/b").await;

    let config = create_test_config(
        vec![format!("{}/articles/a", base)],
        false,
        1,
        &dir.path().join("crawler_state.json"),
    );
    let mut orchestrator = orchestrator(
        config,
        SqliteStore::open_in_memory().unwrap(),
        local_registry(None),
    );

    let summary = orchestrator.run(&CancellationToken::new()).await.unwrap();

    let crawl = summary.crawl.unwrap();
    assert!(crawl.completed);
    assert_eq!(crawl.saved, 1);
    assert_eq!(crawl.links_enqueued, 0);
    assert_eq!(orchestrator.store().count_documents().unwrap(), 1);
}

#[tokio::test]
async fn test_robots_denied_start_url_is_never_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    serve(
        &server,
        "/robots.txt",
        200,
        "User-agent: *\nDisallow: /articles/private".to_string(),
    )
    .await;
    serve_never(&server, "/articles/private").await;
    serve(&server, "/articles/public", 200, article("Public text", &[])).await;

    let config = create_test_config(
        vec![
            format!("{}/articles/private", base),
            format!("{}/articles/public", base),
        ],
        false,
        10,
        &dir.path().join("crawler_state.json"),
    );
    let mut orchestrator = orchestrator(
        config,
        SqliteStore::open_in_memory().unwrap(),
        local_registry(None),
    );

    let crawl = orchestrator
        .run(&CancellationToken::new())
        .await
        .unwrap()
        .crawl
        .unwrap();

    assert_eq!(crawl.seeded, 1);
    assert_eq!(crawl.saved, 1);
    assert!(!orchestrator
        .store()
        .contains(&format!("{}/articles/private", base))
        .unwrap());
}

#[tokio::test]
async fn test_soft_404_and_missing_pages_are_not_stored() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    serve(&server, "/robots.txt", 404, String::new()).await;
    serve(
        &server,
        "/articles/gone",
        200,
        "<html><head><title>Страница не найдена</title></head><body><p>Увы</p></body></html>"
            .to_string(),
    )
    .await;
    serve(&server, "/articles/missing", 404, String::new()).await;

    let config = create_test_config(
        vec![
            format!("{}/articles/gone", base),
            format!("{}/articles/missing", base),
        ],
        false,
        10,
        &dir.path().join("crawler_state.json"),
    );
    let mut orchestrator = orchestrator(
        config,
        SqliteStore::open_in_memory().unwrap(),
        local_registry(None),
    );

    let crawl = orchestrator
        .run(&CancellationToken::new())
        .await
        .unwrap()
        .crawl
        .unwrap();

    assert_eq!(crawl.processed, 2);
    assert_eq!(crawl.skipped, 2);
    assert_eq!(crawl.saved, 0);
    assert_eq!(orchestrator.store().count_documents().unwrap(), 0);
}

#[tokio::test]
async fn test_resume_from_snapshot_skips_seeding() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("crawler_state.json");

    serve(&server, "/robots.txt", 404, String::new()).await;
    serve_never(&server, "/articles/seed").await;
    serve(&server, "/articles/queued", 200, article("Queued text", &[])).await;

    let mut frontier = Frontier::new();
    frontier.enqueue(FrontierEntry::new(format!("{}/articles/queued", base), "local"));
    SnapshotFile::new(&snapshot_path)
        .save(&frontier.snapshot(3))
        .unwrap();

    let config = create_test_config(vec![format!("{}/articles/seed", base)], false, 10, &snapshot_path);
    let mut orchestrator = orchestrator(
        config,
        SqliteStore::open_in_memory().unwrap(),
        local_registry(None),
    );

    let crawl = orchestrator
        .run(&CancellationToken::new())
        .await
        .unwrap()
        .crawl
        .unwrap();

    assert!(crawl.resumed);
    assert_eq!(crawl.seeded, 0);
    assert_eq!(crawl.saved, 1);
    assert_eq!(crawl.saved_total, 4);
    assert!(orchestrator
        .store()
        .contains(&format!("{}/articles/queued", base))
        .unwrap());
    assert!(!snapshot_path.exists());
}

#[tokio::test]
async fn test_cancelled_run_keeps_snapshot() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("crawler_state.json");

    serve(&server, "/robots.txt", 404, String::new()).await;
    serve_never(&server, "/articles/a").await;

    let config = create_test_config(vec![format!("{}/articles/a", base)], false, 10, &snapshot_path);
    let mut orchestrator = orchestrator(
        config,
        SqliteStore::open_in_memory().unwrap(),
        local_registry(None),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = orchestrator.run(&cancel).await.unwrap();

    assert!(summary.cancelled);
    assert!(summary.refresh.is_none());
    assert!(!summary.crawl.unwrap().completed);

    let state = SnapshotFile::new(&snapshot_path)
        .load()
        .unwrap()
        .expect("snapshot should survive cancellation");
    let (frontier, saved) = Frontier::restore(state);
    assert_eq!(saved, 0);
    assert!(frontier.contains(&format!("{}/articles/a", base)));
}

/// Extracts normally but trips the token, as a Ctrl-C landing mid-page would
struct CancellingExtractor(CancellationToken);

impl ContentExtractor for CancellingExtractor {
    fn extract(&self, html: &str, profile: &SourceProfile) -> Extracted {
        self.0.cancel();
        RuleExtractor::new().extract(html, profile)
    }
}

#[tokio::test]
async fn test_cancel_after_save_keeps_snapshot_count_in_step() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("crawler_state.json");

    serve(&server, "/robots.txt", 404, String::new()).await;
    serve(&server, "/articles/a", 200, article("First text", &["/articles/b"])).await;
    serve(&server, "/articles/c", 200, article("Third text", &[])).await;
    serve_never(&server, "/articles/b").await;

    let cancel = CancellationToken::new();
    let config = create_test_config(
        vec![format!("{}/articles/a", base), format!("{}/articles/c", base)],
        false,
        10,
        &snapshot_path,
    );
    let mut orchestrator = Orchestrator::new(
        config,
        SqliteStore::open_in_memory().unwrap(),
        local_registry(None),
        Arc::new(CancellingExtractor(cancel.clone())),
    )
    .expect("Failed to create orchestrator");

    let summary = orchestrator.run(&cancel).await.unwrap();

    assert!(summary.cancelled);
    let crawl = summary.crawl.unwrap();
    assert_eq!(crawl.saved, 1);
    assert_eq!(orchestrator.store().count_documents().unwrap(), 1);

    let state = SnapshotFile::new(&snapshot_path).load().unwrap().unwrap();
    let (frontier, saved) = Frontier::restore(state);
    assert_eq!(saved, 1);
    assert!(frontier.contains(&format!("{}/articles/c", base)));
    assert!(!frontier.contains(&format!("{}/articles/b", base)));
}

#[tokio::test]
async fn test_sitemap_seeding() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    serve(&server, "/robots.txt", 404, String::new()).await;
    serve(
        &server,
        "/sitemap.xml",
        200,
        format!(
            "<sitemapindex><sitemap><loc>{0}/post-sitemap1.xml</loc></sitemap>\
             <sitemap><loc>{0}/page-sitemap.xml</loc></sitemap></sitemapindex>",
            base
        ),
    )
    .await;
    serve(
        &server,
        "/post-sitemap1.xml",
        200,
        format!(
            "<urlset><url><loc>{0}/articles/from-sitemap</loc></url>\
             <url><loc>{0}/about</loc></url></urlset>",
            base
        ),
    )
    .await;
    serve_never(&server, "/page-sitemap.xml").await;
    serve(&server, "/articles/from-sitemap", 200, article("Sitemap text", &[])).await;

    let registry = local_registry(Some(SitemapPlan::new(
        &format!("{}/sitemap.xml", base),
        &["post-sitemap"],
        &[],
    )));
    let config = create_test_config(vec![], true, 10, &dir.path().join("crawler_state.json"));
    let mut orchestrator = orchestrator(config, SqliteStore::open_in_memory().unwrap(), registry);

    let crawl = orchestrator
        .run(&CancellationToken::new())
        .await
        .unwrap()
        .crawl
        .unwrap();

    assert_eq!(crawl.seeded, 1);
    assert_eq!(crawl.saved, 1);
    assert!(orchestrator
        .store()
        .contains(&format!("{}/articles/from-sitemap", base))
        .unwrap());
}

#[tokio::test]
async fn test_store_at_quota_only_refreshes() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let url = format!("{}/articles/a", base);

    serve_never(&server, "/robots.txt").await;
    serve_never(&server, "/articles/seed").await;
    Mock::given(method("GET"))
        .and(path("/articles/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article("Rewritten text", &[]))
                .insert_header("ETag", "\"v2\""),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut store = SqliteStore::open_in_memory().unwrap();
    store.upsert_document(&stale_document(&url, "Original text")).unwrap();

    let config = create_test_config(
        vec![format!("{}/articles/seed", base)],
        false,
        1,
        &dir.path().join("crawler_state.json"),
    );
    let mut first = orchestrator(config.clone(), store, local_registry(None));
    let summary = first.run(&CancellationToken::new()).await.unwrap();

    assert!(summary.crawl.is_none());
    let refresh = summary.refresh.unwrap();
    assert_eq!(refresh.checked, 1);
    assert_eq!(refresh.updated, 1);

    let stored = first.store().get_document(&url).unwrap().unwrap();
    assert_eq!(stored.clean_text, "Rewritten text");
    assert_eq!(stored.etag.as_deref(), Some("\"v2\""));
    assert!(stored.fetched_at > Utc::now() - Duration::minutes(1));

    // A second run finds nothing stale.
    let mut second = orchestrator(config, first.into_store(), local_registry(None));
    let refresh = second
        .run(&CancellationToken::new())
        .await
        .unwrap()
        .refresh
        .unwrap();
    assert_eq!(refresh.checked, 0);
    assert_eq!(second.store().count_documents().unwrap(), 1);
}
