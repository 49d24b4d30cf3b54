//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DocumentStore trait.
//! Timestamps are stored as UTC Unix seconds.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, StorageError, StorageResult};
use crate::storage::Document;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const DOCUMENT_COLUMNS: &str = "original_url, normalized_url, html_content, clean_text, \
     title, author, publish_date, source, fetched_at, last_modified, etag, last_fetch_attempt";

/// SQLite document store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database file and applies the schema
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteStore {
    fn upsert_document(&mut self, document: &Document) -> StorageResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(normalized_url) DO UPDATE SET
                    html_content = excluded.html_content,
                    clean_text = excluded.clean_text,
                    title = excluded.title,
                    author = excluded.author,
                    publish_date = excluded.publish_date,
                    source = excluded.source,
                    last_modified = excluded.last_modified,
                    etag = excluded.etag,
                    last_fetch_attempt = excluded.last_fetch_attempt",
                DOCUMENT_COLUMNS
            ),
            params![
                document.original_url,
                document.normalized_url,
                document.html_content,
                document.clean_text,
                document.title,
                document.author,
                document.publish_date,
                document.source,
                document.fetched_at.timestamp(),
                document.last_modified,
                document.etag,
                document.last_fetch_attempt.timestamp(),
            ],
        )?;
        Ok(())
    }

    fn contains(&self, normalized_url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM documents WHERE normalized_url = ?1",
                params![normalized_url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_document(&self, normalized_url: &str) -> StorageResult<Option<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM documents WHERE normalized_url = ?1",
            DOCUMENT_COLUMNS
        ))?;

        let document = stmt
            .query_row(params![normalized_url], row_to_document)
            .optional()?;

        Ok(document)
    }

    fn count_documents(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn stale_documents(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> StorageResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM documents
             WHERE last_fetch_attempt < ?1
             ORDER BY last_fetch_attempt ASC, id ASC
             LIMIT ?2",
            DOCUMENT_COLUMNS
        ))?;

        let documents = stmt
            .query_map(params![cutoff.timestamp(), limit as i64], row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    fn touch_fetch_attempt(
        &mut self,
        normalized_url: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE documents SET last_fetch_attempt = ?1 WHERE normalized_url = ?2",
            params![at.timestamp(), normalized_url],
        )?;

        if updated == 0 {
            return Err(StorageError::DocumentNotFound(normalized_url.to_string()));
        }
        Ok(())
    }

    fn replace_document(
        &mut self,
        original_normalized_url: &str,
        document: &Document,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE documents SET
                original_url = ?1,
                normalized_url = ?2,
                html_content = ?3,
                clean_text = ?4,
                title = ?5,
                author = ?6,
                publish_date = ?7,
                source = ?8,
                fetched_at = ?9,
                last_modified = ?10,
                etag = ?11,
                last_fetch_attempt = ?12
             WHERE normalized_url = ?13",
            params![
                document.original_url,
                document.normalized_url,
                document.html_content,
                document.clean_text,
                document.title,
                document.author,
                document.publish_date,
                document.source,
                document.fetched_at.timestamp(),
                document.last_modified,
                document.etag,
                document.last_fetch_attempt.timestamp(),
                original_normalized_url,
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::DocumentNotFound(
                original_normalized_url.to_string(),
            ));
        }
        Ok(())
    }
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        original_url: row.get(0)?,
        normalized_url: row.get(1)?,
        html_content: row.get(2)?,
        clean_text: row.get(3)?,
        title: row.get(4)?,
        author: row.get(5)?,
        publish_date: row.get(6)?,
        source: row.get(7)?,
        fetched_at: from_unix(row.get(8)?),
        last_modified: row.get(9)?,
        etag: row.get(10)?,
        last_fetch_attempt: from_unix(row.get(11)?),
    })
}

fn from_unix(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}
