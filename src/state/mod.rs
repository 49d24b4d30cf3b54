//! State module for crash-recoverable crawl progress
//!
//! # Components
//!
//! - `FrontierEntry`: A queued URL with its source identifier
//! - `CrawlState`: Versioned, serializable frontier plus saved-document count
//! - `SnapshotFile`: Atomic load/save/remove of the state file

mod snapshot;

pub use snapshot::{CrawlState, FrontierEntry, SnapshotFile, SNAPSHOT_VERSION};
