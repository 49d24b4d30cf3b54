//! Storage traits and error types
//!
//! This module defines the contract the crawler and the refresh scanner use
//! to read and write harvested documents.

use crate::storage::Document;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Document store contract
///
/// The normalized URL is the unique key: writing a document whose
/// normalized URL is already stored updates that row.
pub trait DocumentStore {
    /// Inserts a document, or overwrites the content, headers, source and
    /// last fetch attempt of the row with the same normalized URL
    ///
    /// `original_url` and `fetched_at` keep the values of the first insert.
    fn upsert_document(&mut self, document: &Document) -> StorageResult<()>;

    /// Checks if a document with this normalized URL is stored
    fn contains(&self, normalized_url: &str) -> StorageResult<bool>;

    /// Gets a document by normalized URL
    fn get_document(&self, normalized_url: &str) -> StorageResult<Option<Document>>;

    /// Counts all stored documents
    fn count_documents(&self) -> StorageResult<u64>;

    /// Gets up to `limit` documents whose last fetch attempt is older than
    /// `cutoff`, oldest attempt first
    fn stale_documents(&self, cutoff: DateTime<Utc>, limit: usize)
        -> StorageResult<Vec<Document>>;

    /// Records a fetch attempt without touching any other field
    fn touch_fetch_attempt(&mut self, normalized_url: &str, at: DateTime<Utc>)
        -> StorageResult<()>;

    /// Rewrites the row stored under `original_normalized_url` with every
    /// field of `document`, including its (possibly new) normalized URL
    ///
    /// # Returns
    ///
    /// * `Err(StorageError::DocumentNotFound)` - No row under that URL
    fn replace_document(
        &mut self,
        original_normalized_url: &str,
        document: &Document,
    ) -> StorageResult<()>;
}
