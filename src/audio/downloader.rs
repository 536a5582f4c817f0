//! Audio download and transcoding.
//!
//! Finds a source for a track with yt-dlp searches, downloads it with a
//! sequence of player-client fallbacks and normalizes it to PCM WAV with ffmpeg.

use super::{run_tool, stderr_excerpt, AudioFetcher};
use async_trait::async_trait;
use crate::config::{DownloadSettings, Settings};
use crate::error::{Result, SlowedError};
use crate::source::Track;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Profile name meaning "let yt-dlp pick its own player client".
const DEFAULT_PROFILE: &str = "default";

/// Characters of stderr kept when logging a failed attempt.
const STDERR_EXCERPT: usize = 100;

/// yt-dlp/ffmpeg wrapper configured from [`DownloadSettings`].
#[derive(Debug, Clone)]
pub struct Downloader {
    ytdlp: String,
    ffmpeg: String,
    profiles: Vec<String>,
    cookies: Option<PathBuf>,
    min_file_bytes: u64,
    sample_rate: u32,
    channels: u16,
}

impl Downloader {
    pub fn from_settings(settings: &DownloadSettings) -> Self {
        let profiles = if settings.client_profiles.is_empty() {
            vec![DEFAULT_PROFILE.to_string()]
        } else {
            settings.client_profiles.clone()
        };

        Self {
            ytdlp: settings.ytdlp_bin.clone(),
            ffmpeg: settings.ffmpeg_bin.clone(),
            profiles,
            cookies: settings
                .cookies_file
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(Settings::expand_path),
            min_file_bytes: settings.min_file_bytes,
            sample_rate: settings.sample_rate,
            channels: settings.channels,
        }
    }

    /// The ffmpeg binary this downloader uses.
    pub fn ffmpeg_bin(&self) -> &str {
        &self.ffmpeg
    }

    /// Search expressions tried by [`Downloader::locate`], SoundCloud first.
    pub fn search_expressions(track: &Track) -> Vec<String> {
        vec![
            format!("scsearch1:{} {}", track.artist, track.title),
            format!("ytsearch1:{} {} official audio", track.artist, track.title),
        ]
    }

    /// Candidate URLs for a track, best first. The track's own watch URL is always last.
    #[instrument(skip(self, track), fields(video_id = %track.video_id))]
    pub async fn locate(&self, track: &Track) -> Result<Vec<String>> {
        let mut candidates = Vec::new();

        for expression in Self::search_expressions(track) {
            let args: Vec<String> = [
                "--no-playlist",
                "--quiet",
                "--no-warnings",
                "--print",
                "webpage_url",
            ]
            .iter()
            .map(|a| a.to_string())
            .chain(std::iter::once(expression.clone()))
            .collect();

            let output = run_tool(&self.ytdlp, &args).await?;
            let stdout = String::from_utf8_lossy(&output.stdout);
            let url = stdout.lines().next().unwrap_or("").trim();

            if output.status.success() && !url.is_empty() {
                info!("Found URL: {}", url.chars().take(60).collect::<String>());
                if !candidates.iter().any(|c| c == url) {
                    candidates.push(url.to_string());
                }
            } else {
                debug!("No result for {}", expression);
            }
        }

        let watch_url = track.watch_url();
        if !candidates.contains(&watch_url) {
            candidates.push(watch_url);
        }

        Ok(candidates)
    }

    /// Player-client profiles to try for `url`. Non-YouTube URLs get one plain attempt.
    fn profiles_for(&self, url: &str) -> Vec<&str> {
        if is_youtube_url(url) {
            self.profiles.iter().map(String::as_str).collect()
        } else {
            vec![DEFAULT_PROFILE]
        }
    }

    /// Active cookies file, if configured and present on disk.
    fn cookies_file(&self) -> Option<&Path> {
        self.cookies.as_deref().filter(|p| p.exists())
    }

    fn download_args(&self, url: &str, template: &Path, profile: &str) -> Vec<String> {
        let mut args: Vec<String> = vec![
            url.to_string(),
            "--no-playlist".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "-x".into(),
            "--audio-format".into(),
            "mp3".into(),
            "--audio-quality".into(),
            "0".into(),
            "-o".into(),
            template.to_string_lossy().into_owned(),
            "--geo-bypass".into(),
        ];

        if profile != DEFAULT_PROFILE {
            args.push("--extractor-args".into());
            args.push(format!("youtube:player_client={profile}"));
        }

        if let Some(cookies) = self.cookies_file() {
            args.push("--cookies".into());
            args.push(cookies.to_string_lossy().into_owned());
        }

        args
    }

    /// Download `url` as `<dir>/<stem>.<ext>`, cycling through client profiles.
    #[instrument(skip(self, dir))]
    pub async fn download(&self, url: &str, stem: &str, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let template = dir.join(format!("{stem}.%(ext)s"));

        for profile in self.profiles_for(url) {
            debug!("Trying player client '{}'", profile);
            let args = self.download_args(url, &template, profile);
            let output = run_tool(&self.ytdlp, &args).await?;

            if output.status.success() {
                if let Some(path) = find_downloaded(dir, stem, self.min_file_bytes) {
                    info!("Downloaded {:?}", path);
                    return Ok(path);
                }
            }

            warn!(
                "Download failed ({}): {}",
                profile,
                stderr_excerpt(&output, STDERR_EXCERPT)
            );
        }

        Err(SlowedError::AudioDownload(format!("all attempts failed for {url}")))
    }

    /// Locate and download a track into `dir`, returning the raw downloaded file.
    #[instrument(skip(self, track, dir), fields(video_id = %track.video_id))]
    pub async fn fetch(&self, track: &Track, dir: &Path) -> Result<PathBuf> {
        info!("Searching sources for: {} - {}", track.artist, track.title);
        let candidates = self.locate(track).await?;
        let stem = format!("{}_raw", track.video_id);

        for url in &candidates {
            match self.download(url, &stem, dir).await {
                Ok(path) => return Ok(path),
                Err(SlowedError::AudioDownload(e)) => debug!("{}", e),
                Err(e) => return Err(e),
            }
        }

        Err(SlowedError::AudioDownload(format!(
            "could not download '{}' from any source",
            track.title
        )))
    }

    /// Convert any audio/video file to 16-bit PCM WAV at the configured rate and layout.
    #[instrument(skip(self))]
    pub async fn transcode(&self, src: &Path, dst: &Path) -> Result<()> {
        let args = self.transcode_args(src, dst);
        let output = run_tool(&self.ffmpeg, &args).await?;

        if !output.status.success() {
            return Err(SlowedError::ToolFailed(format!(
                "ffmpeg transcode failed: {}",
                stderr_excerpt(&output, 500)
            )));
        }
        Ok(())
    }

    fn transcode_args(&self, src: &Path, dst: &Path) -> Vec<String> {
        vec![
            "-i".into(),
            src.to_string_lossy().into_owned(),
            "-vn".into(),
            "-ar".into(),
            self.sample_rate.to_string(),
            "-ac".into(),
            self.channels.to_string(),
            "-c:a".into(),
            "pcm_s16le".into(),
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            dst.to_string_lossy().into_owned(),
        ]
    }

}

#[async_trait]
impl AudioFetcher for Downloader {
    /// Download a track and normalize it to `<dir>/<video_id>.wav`.
    ///
    /// The raw download is removed once transcoded.
    async fn fetch_wav(&self, track: &Track, dir: &Path) -> Result<PathBuf> {
        let raw = self.fetch(track, dir).await?;
        let size_kb = std::fs::metadata(&raw).map(|m| m.len() / 1024).unwrap_or(0);
        info!("Audio ready: {} KB", size_kb);

        let wav = dir.join(format!("{}.wav", track.video_id));
        self.transcode(&raw, &wav).await?;
        if let Err(e) = std::fs::remove_file(&raw) {
            debug!("Could not remove {:?}: {}", raw, e);
        }
        Ok(wav)
    }

    async fn transcode_to_wav(&self, src: &Path, dst: &Path) -> Result<()> {
        self.transcode(src, dst).await
    }
}

fn is_youtube_url(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .map(|host| {
            host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
        })
        .unwrap_or(false)
}

/// Find a finished download named `<stem>.*` larger than `min_bytes`.
fn find_downloaded(dir: &Path, stem: &str, min_bytes: u64) -> Option<PathBuf> {
    let prefix = format!("{stem}.");
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy().into_owned());
            match name {
                Some(n) => n.starts_with(&prefix) && !n.ends_with(".part") && !n.ends_with(".ytdl"),
                None => false,
            }
        })
        .filter(|p| std::fs::metadata(p).map(|m| m.len() > min_bytes).unwrap_or(false))
        .collect();

    found.sort();
    found.into_iter().next()
}
