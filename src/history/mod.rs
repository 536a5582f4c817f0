//! Persistent history for Slowed.
//!
//! Tracks which videos have already been picked (so a track is never used
//! twice) and keeps a log of pipeline runs.

mod memory;
mod sqlite;

pub use memory::MemoryHistory;
pub use sqlite::SqliteHistory;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}

/// One attempt at turning a track into an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub video_id: String,
    pub title: String,
    pub artist: String,
    pub status: RunStatus,
    /// Final output file (successful runs only).
    pub output_path: Option<String>,
    /// Error message (failed runs only).
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    /// Record a successful run.
    pub fn succeeded(
        video_id: &str,
        title: &str,
        artist: &str,
        output_path: &Path,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id: video_id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            status: RunStatus::Succeeded,
            output_path: Some(output_path.display().to_string()),
            error: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Record a failed run.
    pub fn failed(
        video_id: &str,
        title: &str,
        artist: &str,
        error: &str,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id: video_id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            status: RunStatus::Failed,
            output_path: None,
            error: Some(error.to_string()),
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Wall-clock duration of the run in seconds.
    pub fn elapsed_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Trait for history store implementations.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All video IDs that have been picked before.
    async fn seen_ids(&self) -> Result<HashSet<String>>;

    /// Check whether a video ID has been picked before.
    async fn is_seen(&self, video_id: &str) -> Result<bool>;

    /// Add a video ID to the seen set. Returns false if it was already there.
    async fn mark_seen(&self, video_id: &str) -> Result<bool>;

    /// Remove a video ID from the seen set. Returns false if it was absent.
    async fn forget(&self, video_id: &str) -> Result<bool>;

    /// Append a run to the log.
    async fn record_run(&self, record: &RunRecord) -> Result<()>;

    /// Most recent runs first.
    async fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>>;
}

/// Import a legacy `uploaded.json` (a JSON array of video IDs) into the seen set.
///
/// A missing file imports nothing. Returns the number of newly added IDs.
pub async fn import_legacy_json(store: &dyn HistoryStore, path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let content = std::fs::read_to_string(path)?;
    let ids: Vec<String> = serde_json::from_str(&content)?;

    let mut added = 0;
    for id in ids.iter().filter(|id| !id.trim().is_empty()) {
        if store.mark_seen(id.trim()).await? {
            added += 1;
        }
    }

    if added > 0 {
        info!("Imported {} seen IDs from {:?}", added, path);
    } else if !ids.is_empty() {
        warn!("All {} IDs in {:?} were already known", ids.len(), path);
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_import_legacy_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uploaded.json");
        std::fs::write(&path, r#"["abc123DEF45", "zzzzzzzzzzz", "abc123DEF45", ""]"#).unwrap();

        let store = MemoryHistory::new();
        let added = import_legacy_json(&store, &path).await.unwrap();

        assert_eq!(added, 2);
        assert!(store.is_seen("abc123DEF45").await.unwrap());
        assert!(store.is_seen("zzzzzzzzzzz").await.unwrap());

        // Second import adds nothing
        assert_eq!(import_legacy_json(&store, &path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let store = MemoryHistory::new();
        let added = import_legacy_json(&store, Path::new("/nonexistent/uploaded.json"))
            .await
            .unwrap();
        assert_eq!(added, 0);
    }

    #[test]
    fn test_run_record_constructors() {
        let started = Utc::now();
        let ok = RunRecord::succeeded("vid", "Song", "Artist", Path::new("/out/a.mp3"), started);
        assert_eq!(ok.status, RunStatus::Succeeded);
        assert_eq!(ok.output_path.as_deref(), Some("/out/a.mp3"));
        assert!(ok.error.is_none());
        assert!(ok.elapsed_seconds() >= 0);

        let failed = RunRecord::failed("vid", "Song", "Artist", "boom", started);
        assert_eq!(failed.status, RunStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
