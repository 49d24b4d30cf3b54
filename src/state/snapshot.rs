//! Crash-recoverable crawl state
//!
//! The frontier and the saved-document counter are written to a single JSON
//! file after every processed URL. The file exists only while a crawl pass
//! is incomplete.

use crate::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// A queued URL and the source it was discovered for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    /// Normalized URL
    pub url: String,
    /// Source identifier
    pub source: String,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Serializable frontier plus saved-document count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    pub version: u32,
    /// Queued entries, oldest first
    pub entries: Vec<FrontierEntry>,
    /// Membership set of queued normalized URLs
    pub members: Vec<String>,
    pub saved_count: u64,
}

/// Snapshot file on disk
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the snapshot, if there is one
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - No snapshot file
    /// * `Ok(Some(state))` - Snapshot of the current format version
    /// * `Err(HarvestError::SnapshotVersion)` - Snapshot written by another format version
    /// * `Err(HarvestError::SnapshotFormat)` - Unreadable JSON
    pub fn load(&self) -> Result<Option<CrawlState>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let found = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);

        if found != u64::from(SNAPSHOT_VERSION) {
            return Err(HarvestError::SnapshotVersion {
                found,
                expected: SNAPSHOT_VERSION,
            });
        }

        Ok(Some(serde_json::from_value(value)?))
    }

    /// Writes the snapshot through a sibling temp file and a rename
    pub fn save(&self, state: &CrawlState) -> Result<()> {
        let tmp = self.temp_path();
        fs::write(&tmp, serde_json::to_vec(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Deletes the snapshot; a missing file is not an error
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
