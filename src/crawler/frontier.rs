//! FIFO crawl frontier with a membership set
//!
//! A normalized URL is queued at most once. Dequeuing clears its membership,
//! so a URL discovered again after it was processed may be queued again.

use crate::state::{CrawlState, FrontierEntry, SNAPSHOT_VERSION};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    members: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frontier from a snapshot, returning it with the saved count
    ///
    /// Queued URLs missing from the stored membership set are re-marked.
    pub fn restore(state: CrawlState) -> (Self, u64) {
        let mut members: HashSet<String> = state.members.into_iter().collect();
        members.extend(state.entries.iter().map(|entry| entry.url.clone()));

        let frontier = Self {
            queue: state.entries.into(),
            members,
        };
        (frontier, state.saved_count)
    }

    /// Appends an entry unless its URL is already queued
    ///
    /// # Returns
    ///
    /// `true` if the entry was added
    pub fn enqueue(&mut self, entry: FrontierEntry) -> bool {
        if !self.members.insert(entry.url.clone()) {
            return false;
        }
        self.queue.push_back(entry);
        true
    }

    /// Pops the oldest entry and clears its membership
    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.members.remove(&entry.url);
        Some(entry)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.members.contains(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Captures the frontier and `saved_count` for persistence
    pub fn snapshot(&self, saved_count: u64) -> CrawlState {
        let mut members: Vec<String> = self.members.iter().cloned().collect();
        members.sort();

        CrawlState {
            version: SNAPSHOT_VERSION,
            entries: self.queue.iter().cloned().collect(),
            members,
            saved_count,
        }
    }
}
