//! YouTube Data API v3 client.

use super::{parse_iso8601_duration, Candidate, TrackSource};
use crate::config::YoutubeSettings;
use crate::error::{Result, SlowedError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Thin client over the `videos` and `search` endpoints.
pub struct YoutubeApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    region_code: String,
    category_id: String,
    chart_max_results: u32,
    search_max_results: u32,
}

impl YoutubeApi {
    /// Create a client from settings. Fails when no API key is available.
    pub fn from_settings(settings: &YoutubeSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            SlowedError::Config(
                "YOUTUBE_API_KEY not set. Set it with: export YOUTUBE_API_KEY='...'".to_string(),
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            region_code: settings.region_code.clone(),
            category_id: settings.category_id.clone(),
            chart_max_results: settings.chart_max_results,
            search_max_results: settings.search_max_results,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlowedError::TrackSource(format!(
                "{} returned {}: {}",
                endpoint,
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response.json::<T>().await?)
    }

    /// Fetch upload status and region restrictions for a video.
    ///
    /// Returns `None` when the API has no such video.
    #[instrument(skip(self))]
    pub async fn video_status(&self, video_id: &str) -> Result<Option<StatusItem>> {
        let response: ListResponse<StatusItem> = self
            .get(
                "videos",
                &[("part", "status,contentDetails"), ("id", video_id)],
            )
            .await?;

        Ok(response.items.into_iter().next())
    }
}

#[async_trait]
impl TrackSource for YoutubeApi {
    #[instrument(skip(self))]
    async fn chart(&self) -> Result<Vec<Candidate>> {
        let max_results = self.chart_max_results.to_string();
        let response: ListResponse<ChartItem> = self
            .get(
                "videos",
                &[
                    ("part", "snippet,contentDetails,statistics"),
                    ("chart", "mostPopular"),
                    ("videoCategoryId", self.category_id.as_str()),
                    ("regionCode", self.region_code.as_str()),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        debug!("Chart returned {} items", response.items.len());

        Ok(response
            .items
            .into_iter()
            .map(|item| Candidate {
                duration_seconds: Some(parse_iso8601_duration(
                    item.content_details.duration.as_deref().unwrap_or("PT0S"),
                )),
                view_count: item
                    .statistics
                    .view_count
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
                title: item.snippet.title.unwrap_or_else(|| "Unknown".to_string()),
                channel: item
                    .snippet
                    .channel_title
                    .unwrap_or_else(|| "Unknown Artist".to_string()),
                video_id: item.id,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
        let max_results = self.search_max_results.to_string();
        let response: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("videoCategoryId", self.category_id.as_str()),
                    ("order", "viewCount"),
                    ("maxResults", max_results.as_str()),
                    ("videoDuration", "medium"),
                ],
            )
            .await?;

        debug!("Search returned {} items", response.items.len());

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(Candidate {
                    video_id,
                    title: item.snippet.title.unwrap_or_else(|| "Unknown".to_string()),
                    channel: item
                        .snippet
                        .channel_title
                        .unwrap_or_else(|| "Unknown Artist".to_string()),
                    duration_seconds: None,
                    view_count: 0,
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    channel_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    content_details: ChartContentDetails,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
struct ChartContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

/// Status fields of a `videos.list(part=status,contentDetails)` item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusItem {
    #[serde(default)]
    pub status: UploadState,
    #[serde(default)]
    pub content_details: StatusContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadState {
    pub upload_status: Option<String>,
    pub embeddable: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusContentDetails {
    pub region_restriction: Option<RegionRestriction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionRestriction {
    #[serde(default)]
    pub blocked: Vec<String>,
    #[serde(default)]
    pub allowed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> YoutubeApi {
        let settings = YoutubeSettings {
            api_key: Some("test-key".to_string()),
            api_base_url: server.uri(),
            ..Default::default()
        };
        YoutubeApi::from_settings(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_chart_parses_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("chart", "mostPopular"))
            .and(query_param("videoCategoryId", "10"))
            .and(query_param("regionCode", "US"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {
                        "id": "abcdefghijk",
                        "snippet": {"title": "Song (Official Video)", "channelTitle": "SingerVEVO"},
                        "contentDetails": {"duration": "PT3M20S"},
                        "statistics": {"viewCount": "12345"}
                    },
                    {
                        "id": "lmnopqrstuv",
                        "snippet": {},
                        "contentDetails": {}
                    }
                ]
            })))
            .mount(&server)
            .await;

        let candidates = api_for(&server).chart().await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].video_id, "abcdefghijk");
        assert_eq!(candidates[0].duration_seconds, Some(200));
        assert_eq!(candidates[0].view_count, 12345);
        assert_eq!(candidates[1].title, "Unknown");
        assert_eq!(candidates[1].channel, "Unknown Artist");
        assert_eq!(candidates[1].duration_seconds, Some(0));
    }

    #[tokio::test]
    async fn test_search_skips_non_video_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "viral songs"))
            .and(query_param("order", "viewCount"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": {"kind": "youtube#channel"}, "snippet": {"title": "A channel"}},
                    {"id": {"videoId": "abcdefghijk"}, "snippet": {"title": "Hit", "channelTitle": "Band"}}
                ]
            })))
            .mount(&server)
            .await;

        let candidates = api_for(&server).search("viral songs").await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].video_id, "abcdefghijk");
        assert_eq!(candidates[0].duration_seconds, None);
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let err = api_for(&server).chart().await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_video_status_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "missing0000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .mount(&server)
            .await;

        let item = api_for(&server).video_status("missing0000").await.unwrap();
        assert!(item.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        std::env::remove_var("YOUTUBE_API_KEY");
        let settings = YoutubeSettings::default();
        assert!(YoutubeApi::from_settings(&settings).is_err());
    }
}
