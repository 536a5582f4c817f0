//! Availability and copyright checks for uploaded videos.

use crate::source::{StatusItem, YoutubeApi};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Fewer allowed regions than this counts as a restriction.
const MIN_ALLOWED_REGIONS: usize = 50;

/// Availability of a video after upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoStatus {
    /// Unavailable everywhere (rejected, failed or missing).
    pub blocked: bool,
    /// Unavailable in some regions.
    pub restricted: bool,
    /// Human-readable description.
    pub status: String,
}

impl VideoStatus {
    fn blocked(status: &str) -> Self {
        Self {
            blocked: true,
            restricted: false,
            status: status.to_string(),
        }
    }

    fn restricted(status: String) -> Self {
        Self {
            blocked: false,
            restricted: true,
            status,
        }
    }

    fn ok(status: &str) -> Self {
        Self {
            blocked: false,
            restricted: false,
            status: status.to_string(),
        }
    }

    /// Used when the API could not be queried.
    pub fn unknown() -> Self {
        Self::ok("Unknown (couldn't check)")
    }

    /// True when the video is fully available.
    pub fn is_available(&self) -> bool {
        !self.blocked && !self.restricted
    }
}

/// Classify an API status item. `None` means the video was not found.
pub fn classify(item: Option<&StatusItem>) -> VideoStatus {
    let Some(item) = item else {
        return VideoStatus::blocked("Video not found");
    };

    let upload_status = item.status.upload_status.as_deref().unwrap_or("");
    match upload_status {
        "rejected" => return VideoStatus::blocked("Rejected by YouTube"),
        "failed" => return VideoStatus::blocked("Upload failed"),
        _ => {}
    }

    if let Some(restriction) = &item.content_details.region_restriction {
        let blocked = &restriction.blocked;
        let allowed = &restriction.allowed;
        if !blocked.is_empty() || (!allowed.is_empty() && allowed.len() < MIN_ALLOWED_REGIONS) {
            return VideoStatus::restricted(format!("Blocked in {} regions", blocked.len()));
        }
    }

    VideoStatus::ok("Available worldwide")
}

/// Wait for the platform to settle, then check whether a video is blocked or restricted.
///
/// API errors never propagate; they produce [`VideoStatus::unknown`].
#[instrument(skip(api))]
pub async fn check_video_status(api: &YoutubeApi, video_id: &str, settle: Duration) -> VideoStatus {
    info!("Checking copyright status for video {}...", video_id);

    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    match api.video_status(video_id).await {
        Ok(item) => {
            let status = classify(item.as_ref());
            info!("Status for {}: {}", video_id, status.status);
            status
        }
        Err(e) => {
            warn!("Error checking status: {}", e);
            VideoStatus::unknown()
        }
    }
}
