//! In-memory history store.
//!
//! Useful for testing and dry runs.

use super::{HistoryStore, RunRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

/// In-memory history store.
pub struct MemoryHistory {
    seen: RwLock<HashSet<String>>,
    runs: RwLock<Vec<RunRecord>>,
}

impl MemoryHistory {
    /// Create an empty in-memory history.
    pub fn new() -> Self {
        Self {
            seen: RwLock::new(HashSet::new()),
            runs: RwLock::new(Vec::new()),
        }
    }

    /// Create a history pre-populated with seen IDs.
    pub fn with_seen<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seen: RwLock::new(ids.into_iter().map(Into::into).collect()),
            runs: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn seen_ids(&self) -> Result<HashSet<String>> {
        Ok(self.seen.read().unwrap().clone())
    }

    async fn is_seen(&self, video_id: &str) -> Result<bool> {
        Ok(self.seen.read().unwrap().contains(video_id))
    }

    async fn mark_seen(&self, video_id: &str) -> Result<bool> {
        Ok(self.seen.write().unwrap().insert(video_id.to_string()))
    }

    async fn forget(&self, video_id: &str) -> Result<bool> {
        Ok(self.seen.write().unwrap().remove(video_id))
    }

    async fn record_run(&self, record: &RunRecord) -> Result<()> {
        self.runs.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let runs = self.runs.read().unwrap();
        Ok(runs.iter().rev().take(limit).cloned().collect())
    }
}
