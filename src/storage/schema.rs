//! Database schema definitions
//!
//! This module contains the SQL schema for the document store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per harvested article, keyed by its normalized URL
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_url TEXT NOT NULL,
    normalized_url TEXT NOT NULL UNIQUE,
    html_content TEXT NOT NULL,
    clean_text TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    author TEXT NOT NULL DEFAULT '',
    publish_date TEXT NOT NULL DEFAULT '',
    source TEXT NOT NULL,
    fetched_at INTEGER NOT NULL,
    last_modified TEXT,
    etag TEXT,
    last_fetch_attempt INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_last_fetch_attempt ON documents(last_fetch_attempt);
CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
