//! SQLite-based history store.

use super::{HistoryStore, RunRecord, RunStatus};
use crate::error::{Result, SlowedError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS seen_videos (
        video_id TEXT PRIMARY KEY,
        seen_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS runs (
        id TEXT PRIMARY KEY,
        video_id TEXT NOT NULL,
        title TEXT NOT NULL,
        artist TEXT NOT NULL,
        status TEXT NOT NULL,
        output_path TEXT,
        error TEXT,
        started_at TEXT NOT NULL,
        finished_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_runs_video_id ON runs(video_id);
"#;

/// SQLite-based history store.
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    /// Open (or create) the history database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened history database at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory history database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SlowedError::History(format!("Failed to acquire lock: {}", e)))
    }

    fn parse_time(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn seen_ids(&self) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT video_id FROM seen_videos")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn is_seen(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM seen_videos WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn mark_seen(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO seen_videos (video_id, seen_at) VALUES (?1, ?2)",
            params![video_id, Utc::now().to_rfc3339()],
        )?;
        debug!("Marked {} as seen (new: {})", video_id, inserted > 0);
        Ok(inserted > 0)
    }

    #[instrument(skip(self))]
    async fn forget(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM seen_videos WHERE video_id = ?1",
            params![video_id],
        )?;
        Ok(deleted > 0)
    }

    #[instrument(skip(self, record), fields(video_id = %record.video_id))]
    async fn record_run(&self, record: &RunRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO runs
            (id, video_id, title, artist, status, output_path, error, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id.to_string(),
                record.video_id,
                record.title,
                record.artist,
                record.status.to_string(),
                record.output_path,
                record.error,
                record.started_at.to_rfc3339(),
                record.finished_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, video_id, title, artist, status, output_path, error,
                   started_at, finished_at
            FROM runs
            ORDER BY rowid DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let id_str: String = row.get(0)?;
            let status_str: String = row.get(4)?;
            let started_str: String = row.get(7)?;
            let finished_str: String = row.get(8)?;

            Ok(RunRecord {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                video_id: row.get(1)?,
                title: row.get(2)?,
                artist: row.get(3)?,
                status: status_str.parse().unwrap_or(RunStatus::Failed),
                output_path: row.get(5)?,
                error: row.get(6)?,
                started_at: Self::parse_time(&started_str),
                finished_at: Self::parse_time(&finished_str),
            })
        })?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}
