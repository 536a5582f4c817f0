//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SlowedError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// A full run needs the API key, yt-dlp and ffmpeg.
    Run,
    /// Track selection and status checks need the API key.
    Select,
    /// Local processing needs ffmpeg.
    Process,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Run => {
            check_api_key(settings)?;
            check_tool(&settings.download.ytdlp_bin)?;
            check_tool(&settings.download.ffmpeg_bin)?;
        }
        Operation::Select => {
            check_api_key(settings)?;
        }
        Operation::Process => {
            check_tool(&settings.download.ffmpeg_bin)?;
        }
    }
    settings.effects.validate()
}

/// Check that a YouTube API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    match settings.youtube.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(SlowedError::Config(
            "YOUTUBE_API_KEY not set. Set it with: export YOUTUBE_API_KEY='...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    let version_arg = if is_ffmpeg(name) { "-version" } else { "--version" };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SlowedError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SlowedError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SlowedError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

/// ffmpeg-family tools take `-version` with a single dash.
pub fn is_ffmpeg(name: &str) -> bool {
    std::path::Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().starts_with("ff"))
        .unwrap_or(false)
}
