//! Status command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::source::YoutubeApi;
use crate::status::check_video_status;
use anyhow::Result;
use std::time::Duration;

/// Report whether a video is blocked or region-restricted.
pub async fn run_status(video_id: &str, wait: Option<u64>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Select, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let api = YoutubeApi::from_settings(&settings.youtube)?;
    let settle = Duration::from_secs(wait.unwrap_or(settings.youtube.status_settle_seconds));

    let spinner = Output::spinner(&format!("Checking {}...", video_id));
    let status = check_video_status(&api, video_id, settle).await;
    spinner.finish_and_clear();

    Output::header(&format!("Status of {}", video_id));
    Output::kv("Status", &status.status);
    Output::kv("Blocked", &status.blocked.to_string());
    Output::kv("Restricted", &status.restricted.to_string());

    if status.is_available() {
        Output::success("Video is available");
    } else {
        Output::warning("Video is not fully available");
    }

    Ok(())
}
