//! Article Harvester main entry point
//!
//! Command-line interface: one run crawls (or resumes) until the frontier
//! drains or the quota is reached, then refreshes stale documents.

use anyhow::Context;
use article_harvester::config::{load_config, Config};
use article_harvester::state::SnapshotFile;
use article_harvester::storage::open_store;
use article_harvester::{Orchestrator, RuleExtractor, RunSummary, SourceRegistry};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Article Harvester: an incremental, polite article crawler
///
/// Harvests parenting articles from 7ya.ru, mama.ru and letidor.ru into a
/// SQLite document store, respecting robots.txt, and keeps stored documents
/// fresh with conditional re-fetches.
#[derive(Parser, Debug)]
#[command(name = "article-harvester")]
#[command(version = "1.0.0")]
#[command(about = "An incremental, polite article crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard a saved crawl snapshot and seed a fresh frontier
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config, cli.fresh).await
}

/// Sets up the tracing subscriber; `RUST_LOG` overrides the verbosity flags
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("article_harvester=info,warn"),
                1 => EnvFilter::new("article_harvester=debug,info"),
                _ => EnvFilter::new("article_harvester=trace,debug"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn handle_dry_run(config: &Config) {
    println!("=== Article Harvester Dry Run ===\n");

    println!("Store: {}", config.store.database_path);
    let snapshot = SnapshotFile::new(&config.crawl.snapshot_path);
    if snapshot.exists() {
        println!("Snapshot: {} (next run resumes)", config.crawl.snapshot_path);
    } else {
        println!("Snapshot: {} (next run seeds)", config.crawl.snapshot_path);
    }
    println!("User agent: {}", config.crawl.user_agent);
    println!("Delay: {:?}", config.crawl.delay());
    println!("Max documents: {}", config.crawl.max_documents);
    println!("Refresh after: {} days", config.crawl.refresh_interval_days);

    println!("\nSources ({}):", config.crawl.sources.len());
    for source in &config.crawl.sources {
        let sitemap = if source.use_sitemap { ", sitemap" } else { "" };
        println!("  - {} ({} start URLs{})", source.name, source.start_urls.len(), sitemap);
        for url in &source.start_urls {
            println!("    * {}", url);
        }
    }

    println!("\n✓ Configuration is valid");
}

async fn handle_harvest(config: Config, fresh: bool) -> anyhow::Result<()> {
    let store = open_store(Path::new(&config.store.database_path))
        .with_context(|| format!("failed to open store {}", config.store.database_path))?;

    if fresh {
        tracing::info!("Discarding crawl snapshot {}", config.crawl.snapshot_path);
        SnapshotFile::new(&config.crawl.snapshot_path).remove()?;
    }

    let mut orchestrator = Orchestrator::new(
        config.crawl,
        store,
        SourceRegistry::builtin(),
        Arc::new(RuleExtractor::new()),
    )?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            signal_token.cancel();
        }
    });

    let summary = orchestrator.run(&cancel).await?;
    report(&summary);

    Ok(())
}

fn report(summary: &RunSummary) {
    match &summary.crawl {
        Some(crawl) => tracing::info!(
            "Crawl: {} saved ({} total), {} skipped, {} links queued{}",
            crawl.saved,
            crawl.saved_total,
            crawl.skipped,
            crawl.links_enqueued,
            if crawl.resumed { ", resumed" } else { "" }
        ),
        None => tracing::info!("Crawl: skipped, store at quota"),
    }

    if let Some(refresh) = &summary.refresh {
        tracing::info!(
            "Refresh: {} checked, {} updated, {} unchanged",
            refresh.checked,
            refresh.updated,
            refresh.unchanged
        );
    }

    if summary.cancelled {
        tracing::info!("Run was interrupted; the next run resumes where this one stopped");
    }
}
