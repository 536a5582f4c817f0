//! External audio tooling: yt-dlp downloads and ffmpeg transcodes.

pub mod downloader;
mod encode;

pub use downloader::Downloader;
pub use encode::{encode_mp3, Mp3Tags};

use crate::error::{Result, SlowedError};
use crate::source::Track;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Trait for turning a selected track into a local PCM WAV file.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Download `track` into `dir` and return the path of the WAV file.
    async fn fetch_wav(&self, track: &Track, dir: &Path) -> Result<PathBuf>;

    /// Convert an arbitrary local media file to WAV.
    async fn transcode_to_wav(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// Run an external tool to completion, capturing stdout and stderr.
///
/// A missing binary maps to [`SlowedError::ToolNotFound`]. A non-zero exit is
/// returned as-is for the caller to interpret.
pub(crate) async fn run_tool(bin: &str, args: &[String]) -> Result<Output> {
    let result = Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(output) => Ok(output),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SlowedError::ToolNotFound(bin.to_string()))
        }
        Err(e) => Err(SlowedError::ToolFailed(format!("{bin}: {e}"))),
    }
}

/// First `max` characters of a tool's stderr, trimmed.
pub(crate) fn stderr_excerpt(output: &Output, max: usize) -> String {
    String::from_utf8_lossy(&output.stderr)
        .chars()
        .take(max)
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let err = run_tool("slowed-no-such-binary", &[]).await.unwrap_err();
        assert!(matches!(err, SlowedError::ToolNotFound(name) if name == "slowed-no-such-binary"));
    }
}
