//! Storage module for persisting harvested documents
//!
//! This module handles all database operations for the harvester:
//! - SQLite database initialization and schema management
//! - Idempotent document upserts keyed by normalized URL
//! - Staleness queries and fetch-attempt bookkeeping for the refresh scanner

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{DocumentStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens (creating if needed) the SQLite document store at `path`
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened store
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::open(path)
}

/// One harvested article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The URL that was dequeued for this document
    pub original_url: String,
    /// Canonical URL after redirects; the unique key
    pub normalized_url: String,
    /// Raw response body
    pub html_content: String,
    pub clean_text: String,
    pub title: String,
    pub author: String,
    pub publish_date: String,
    /// Source identifier (e.g. "mama.ru")
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    /// Last-Modified response header, replayed as If-Modified-Since
    pub last_modified: Option<String>,
    /// ETag response header, replayed as If-None-Match
    pub etag: Option<String>,
    pub last_fetch_attempt: DateTime<Utc>,
}
