//! Trending track discovery.
//!
//! A [`TrackSource`] lists raw candidates (chart entries or search hits);
//! the [`TrackSelector`] filters them against the seen set, the blocklist
//! and the duration window, and persists its pick.

mod clean;
mod youtube;

pub use clean::{clean_artist, clean_title, parse_iso8601_duration};
pub use youtube::{RegionRestriction, StatusContentDetails, StatusItem, UploadState, YoutubeApi};

use crate::config::YoutubeSettings;
use crate::error::Result;
use crate::history::HistoryStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Duration reported for search hits, which carry no length.
pub const SEARCH_FALLBACK_DURATION: u32 = 180;

/// Where a track was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackOrigin {
    Chart,
    Search,
}

impl std::fmt::Display for TrackOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackOrigin::Chart => write!(f, "chart"),
            TrackOrigin::Search => write!(f, "search"),
        }
    }
}

/// A raw entry returned by a source, before filtering and cleanup.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    /// Length in seconds, when the source reports it.
    pub duration_seconds: Option<u32>,
    pub view_count: u64,
}

/// A track chosen for processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub video_id: String,
    pub title: String,
    pub artist: String,
    pub duration_seconds: u32,
    pub view_count: u64,
    pub origin: TrackOrigin,
}

impl Track {
    /// Build a track from a local file or manual input.
    pub fn manual(video_id: &str, title: &str, artist: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            duration_seconds: 0,
            view_count: 0,
            origin: TrackOrigin::Search,
        }
    }

    /// Watch URL of the source video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    /// Format the duration as M:SS.
    pub fn format_duration(&self) -> String {
        format!("{}:{:02}", self.duration_seconds / 60, self.duration_seconds % 60)
    }
}

/// Trait for trending-track providers.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Current popular-music chart, in chart order.
    async fn chart(&self) -> Result<Vec<Candidate>>;

    /// Search results for a query, most viewed first.
    async fn search(&self, query: &str) -> Result<Vec<Candidate>>;
}

/// Filtering rules applied to candidates.
#[derive(Debug, Clone)]
pub struct SelectionRules {
    pub min_duration_seconds: u32,
    pub max_duration_seconds: u32,
    pub blocklist: HashSet<String>,
    pub search_queries: Vec<String>,
}

impl From<&YoutubeSettings> for SelectionRules {
    fn from(settings: &YoutubeSettings) -> Self {
        Self {
            min_duration_seconds: settings.min_duration_seconds,
            max_duration_seconds: settings.max_duration_seconds,
            blocklist: settings.blocklist.iter().cloned().collect(),
            search_queries: settings.search_queries.clone(),
        }
    }
}

/// First chart entry that is unseen and inside the duration window.
pub fn pick_from_chart(
    candidates: &[Candidate],
    skip: &HashSet<String>,
    rules: &SelectionRules,
) -> Option<Track> {
    candidates
        .iter()
        .filter(|c| !skip.contains(&c.video_id))
        .find(|c| {
            let secs = c.duration_seconds.unwrap_or(0);
            (rules.min_duration_seconds..=rules.max_duration_seconds).contains(&secs)
        })
        .map(|c| Track {
            video_id: c.video_id.clone(),
            title: clean_title(&c.title),
            artist: clean_artist(&c.channel),
            duration_seconds: c.duration_seconds.unwrap_or(0),
            view_count: c.view_count,
            origin: TrackOrigin::Chart,
        })
}

/// First search hit that is unseen. Search hits carry no duration.
pub fn pick_from_search(candidates: &[Candidate], skip: &HashSet<String>) -> Option<Track> {
    candidates
        .iter()
        .find(|c| !skip.contains(&c.video_id))
        .map(|c| Track {
            video_id: c.video_id.clone(),
            title: clean_title(&c.title),
            artist: clean_artist(&c.channel),
            duration_seconds: SEARCH_FALLBACK_DURATION,
            view_count: 0,
            origin: TrackOrigin::Search,
        })
}

/// Picks the next track: chart first, random search query as fallback.
pub struct TrackSelector {
    source: Arc<dyn TrackSource>,
    history: Arc<dyn HistoryStore>,
    rules: SelectionRules,
}

impl TrackSelector {
    pub fn new(
        source: Arc<dyn TrackSource>,
        history: Arc<dyn HistoryStore>,
        rules: SelectionRules,
    ) -> Self {
        Self {
            source,
            history,
            rules,
        }
    }

    /// Select a track and add it to the seen set.
    ///
    /// The pick is persisted before any download happens, so a track that
    /// later fails is not offered again.
    pub async fn select(&self) -> Result<Option<Track>> {
        self.select_inner(true).await
    }

    /// Select a track without touching the seen set.
    pub async fn peek(&self) -> Result<Option<Track>> {
        self.select_inner(false).await
    }

    #[instrument(skip(self))]
    async fn select_inner(&self, persist: bool) -> Result<Option<Track>> {
        let mut skip = self.history.seen_ids().await?;
        skip.extend(self.rules.blocklist.iter().cloned());

        match self.source.chart().await {
            Ok(candidates) => {
                if let Some(track) = pick_from_chart(&candidates, &skip, &self.rules) {
                    info!(
                        "Selected from chart: {} ({}s)",
                        track.title, track.duration_seconds
                    );
                    return self.finish(track, persist).await.map(Some);
                }
                info!(
                    "No usable chart entry among {} candidates, searching instead",
                    candidates.len()
                );
            }
            Err(e) => {
                warn!("Chart lookup failed ({}), falling back to search...", e);
            }
        }

        let Some(query) = self.random_query() else {
            error!("No search queries configured");
            return Ok(None);
        };
        info!("Searching: '{}'", query);

        let candidates = self.source.search(&query).await?;
        match pick_from_search(&candidates, &skip) {
            Some(track) => {
                info!("Selected from search: {}", track.title);
                self.finish(track, persist).await.map(Some)
            }
            None => {
                error!("No new trending songs found!");
                Ok(None)
            }
        }
    }

    async fn finish(&self, track: Track, persist: bool) -> Result<Track> {
        if persist {
            self.history.mark_seen(&track.video_id).await?;
        }
        Ok(track)
    }

    fn random_query(&self) -> Option<String> {
        if self.rules.search_queries.is_empty() {
            return None;
        }
        let idx = fastrand::usize(..self.rules.search_queries.len());
        Some(self.rules.search_queries[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlowedError;
    use crate::history::MemoryHistory;
    use std::sync::Mutex;

    fn candidate(id: &str, secs: Option<u32>) -> Candidate {
        Candidate {
            video_id: id.to_string(),
            title: format!("{} (Official Video)", id),
            channel: "ArtistVEVO".to_string(),
            duration_seconds: secs,
            view_count: 1000,
        }
    }

    fn rules() -> SelectionRules {
        SelectionRules {
            min_duration_seconds: 60,
            max_duration_seconds: 480,
            blocklist: ["blocked".to_string()].into_iter().collect(),
            search_queries: vec!["only query".to_string()],
        }
    }

    struct FakeSource {
        chart: Option<Vec<Candidate>>,
        search: Vec<Candidate>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TrackSource for FakeSource {
        async fn chart(&self) -> Result<Vec<Candidate>> {
            self.chart
                .clone()
                .ok_or_else(|| SlowedError::TrackSource("quota exceeded".into()))
        }

        async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.search.clone())
        }
    }

    #[test]
    fn test_pick_from_chart_filters() {
        let candidates = vec![
            candidate("seen", Some(200)),
            candidate("blocked", Some(200)),
            candidate("short", Some(59)),
            candidate("long", Some(481)),
            candidate("edge", Some(480)),
            candidate("later", Some(200)),
        ];
        let mut skip: HashSet<String> = ["seen".to_string()].into_iter().collect();
        skip.extend(rules().blocklist);

        let track = pick_from_chart(&candidates, &skip, &rules()).unwrap();
        assert_eq!(track.video_id, "edge");
        assert_eq!(track.title, "edge");
        assert_eq!(track.artist, "Artist");
        assert_eq!(track.origin, TrackOrigin::Chart);
    }

    #[test]
    fn test_pick_from_search_uses_default_duration() {
        let candidates = vec![candidate("a", None), candidate("b", None)];
        let skip: HashSet<String> = ["a".to_string()].into_iter().collect();

        let track = pick_from_search(&candidates, &skip).unwrap();
        assert_eq!(track.video_id, "b");
        assert_eq!(track.duration_seconds, SEARCH_FALLBACK_DURATION);
        assert_eq!(track.view_count, 0);
    }

    #[tokio::test]
    async fn test_select_prefers_chart_and_persists() {
        let source = Arc::new(FakeSource {
            chart: Some(vec![candidate("chart1", Some(200))]),
            search: vec![candidate("search1", None)],
            queries: Mutex::new(Vec::new()),
        });
        let history = Arc::new(MemoryHistory::new());
        let selector = TrackSelector::new(source.clone(), history.clone(), rules());

        let track = selector.select().await.unwrap().unwrap();
        assert_eq!(track.video_id, "chart1");
        assert!(history.is_seen("chart1").await.unwrap());
        assert!(source.queries.lock().unwrap().is_empty());

        // Chart exhausted now, so the next pick comes from search
        let next = selector.select().await.unwrap().unwrap();
        assert_eq!(next.video_id, "search1");
        assert_eq!(next.origin, TrackOrigin::Search);
        assert_eq!(source.queries.lock().unwrap().as_slice(), ["only query"]);
    }

    #[tokio::test]
    async fn test_select_falls_back_when_chart_fails() {
        let source = Arc::new(FakeSource {
            chart: None,
            search: vec![candidate("blocked", None), candidate("ok", None)],
            queries: Mutex::new(Vec::new()),
        });
        let history = Arc::new(MemoryHistory::new());
        let selector = TrackSelector::new(source, history, rules());

        let track = selector.select().await.unwrap().unwrap();
        assert_eq!(track.video_id, "ok");
    }

    #[tokio::test]
    async fn test_peek_does_not_persist() {
        let source = Arc::new(FakeSource {
            chart: Some(vec![candidate("chart1", Some(200))]),
            search: vec![],
            queries: Mutex::new(Vec::new()),
        });
        let history = Arc::new(MemoryHistory::new());
        let selector = TrackSelector::new(source, history.clone(), rules());

        let track = selector.peek().await.unwrap().unwrap();
        assert_eq!(track.video_id, "chart1");
        assert!(!history.is_seen("chart1").await.unwrap());
    }

    #[tokio::test]
    async fn test_select_none_when_everything_seen() {
        let source = Arc::new(FakeSource {
            chart: Some(vec![candidate("x", Some(200))]),
            search: vec![candidate("x", None)],
            queries: Mutex::new(Vec::new()),
        });
        let history = Arc::new(MemoryHistory::with_seen(["x"]));
        let selector = TrackSelector::new(source, history, rules());

        assert!(selector.select().await.unwrap().is_none());
    }

    #[test]
    fn test_track_format_duration() {
        let mut track = Track::manual("id", "t", "a");
        track.duration_seconds = 213;
        assert_eq!(track.format_duration(), "3:33");
        assert_eq!(track.watch_url(), "https://www.youtube.com/watch?v=id");
    }
}
