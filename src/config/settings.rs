//! Configuration settings for Slowed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub youtube: YoutubeSettings,
    pub download: DownloadSettings,
    pub effects: EffectsSettings,
    pub notify: NotifySettings,
    pub history: HistorySettings,
    pub pipeline: PipelineSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files (wiped after every run).
    pub temp_dir: String,
    /// Directory finished tracks are written to.
    pub output_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.slowed".to_string(),
            temp_dir: "/tmp/slowed".to_string(),
            output_dir: "~/.slowed/output".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// YouTube Data API settings used for track discovery and status checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key. Falls back to `YOUTUBE_API_KEY`.
    pub api_key: Option<String>,
    /// Base URL of the Data API.
    pub api_base_url: String,
    /// Region used for the most-popular chart.
    pub region_code: String,
    /// Video category (10 = Music).
    pub category_id: String,
    pub chart_max_results: u32,
    pub search_max_results: u32,
    /// Shortest acceptable chart track, in seconds (inclusive).
    pub min_duration_seconds: u32,
    /// Longest acceptable chart track, in seconds (inclusive).
    pub max_duration_seconds: u32,
    /// Queries for the search fallback; one is picked at random per run.
    pub search_queries: Vec<String>,
    /// Video IDs that are never selected.
    pub blocklist: Vec<String>,
    /// Seconds to wait before checking an uploaded video's status.
    pub status_settle_seconds: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            region_code: "US".to_string(),
            category_id: "10".to_string(),
            chart_max_results: 50,
            search_max_results: 25,
            min_duration_seconds: 60,
            max_duration_seconds: 480,
            search_queries: [
                "trending songs 2025",
                "top hits 2025 official audio",
                "viral songs this week 2025",
                "new music 2025 popular",
                "best songs 2025 trending",
                "most streamed songs 2025",
                "viral hindi songs 2025",
                "viral english songs 2025",
            ]
            .iter()
            .map(|q| q.to_string())
            .collect(),
            // Consistently fails with "format unavailable"
            blocklist: vec!["c5aYTMnACfk".to_string()],
            status_settle_seconds: 10,
        }
    }
}

impl YoutubeSettings {
    /// Resolve the API key from config or the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("YOUTUBE_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Download and transcode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    /// yt-dlp YouTube player clients to try in order. `default` means no override.
    pub client_profiles: Vec<String>,
    /// Netscape cookies file passed to yt-dlp when present.
    pub cookies_file: Option<String>,
    /// Downloads at or below this size are treated as failures.
    pub min_file_bytes: u64,
    /// Sample rate of the normalized PCM file.
    pub sample_rate: u32,
    /// Channel count of the normalized PCM file.
    pub channels: u16,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            client_profiles: ["default", "android", "web_safari", "tv_embedded"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cookies_file: None,
            min_file_bytes: 10_000,
            sample_rate: 44_100,
            channels: 2,
        }
    }
}

/// How the final loudness is set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoudnessMode {
    /// Integrated loudness (BS.1770) targeting.
    #[default]
    Lufs,
    /// Plain peak normalization.
    Peak,
}

impl std::str::FromStr for LoudnessMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lufs" | "loudness" => Ok(LoudnessMode::Lufs),
            "peak" => Ok(LoudnessMode::Peak),
            _ => Err(format!("Unknown loudness mode: {}", s)),
        }
    }
}

impl std::fmt::Display for LoudnessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoudnessMode::Lufs => write!(f, "lufs"),
            LoudnessMode::Peak => write!(f, "peak"),
        }
    }
}

/// Parameters of the slowed + reverb chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsSettings {
    /// Playback rate of the time-stretch (below 1.0 slows down).
    pub slow_factor: f64,
    pub stretch_fft_size: usize,
    pub stretch_hop: usize,

    pub compressor_threshold_db: f32,
    pub compressor_ratio: f32,
    pub compressor_attack_ms: f32,
    pub compressor_release_ms: f32,

    pub low_shelf_hz: f32,
    pub low_shelf_gain_db: f32,
    pub high_shelf_hz: f32,
    pub high_shelf_gain_db: f32,

    pub reverb_room_size: f32,
    pub reverb_damping: f32,
    pub reverb_wet: f32,
    pub reverb_width: f32,
    pub reverb_freeze: f32,

    pub loudness_mode: LoudnessMode,
    pub target_lufs: f64,
    /// Target peak for `peak` mode.
    pub peak_target: f32,

    pub fade_in_ms: u32,
    pub fade_out_ms: u32,

    /// MP3 bitrate in kbps.
    pub mp3_bitrate_kbps: u32,
}

impl Default for EffectsSettings {
    fn default() -> Self {
        Self {
            slow_factor: 0.80,
            stretch_fft_size: 2048,
            stretch_hop: 512,
            compressor_threshold_db: -18.0,
            compressor_ratio: 3.0,
            compressor_attack_ms: 5.0,
            compressor_release_ms: 100.0,
            low_shelf_hz: 200.0,
            low_shelf_gain_db: 3.0,
            high_shelf_hz: 8000.0,
            high_shelf_gain_db: -2.5,
            reverb_room_size: 0.75,
            reverb_damping: 0.6,
            reverb_wet: 0.35,
            reverb_width: 0.9,
            reverb_freeze: 0.0,
            loudness_mode: LoudnessMode::Lufs,
            target_lufs: -14.0,
            peak_target: 0.9,
            fade_in_ms: 3000,
            fade_out_ms: 4000,
            mp3_bitrate_kbps: 320,
        }
    }
}

impl EffectsSettings {
    /// Dry level paired with the configured wet level.
    pub fn reverb_dry(&self) -> f32 {
        1.0 - self.reverb_wet
    }

    /// Check parameter ranges before any audio is touched.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SlowedError;

        if !(self.slow_factor > 0.0 && self.slow_factor <= 4.0) {
            return Err(SlowedError::Config(format!(
                "effects.slow_factor must be in (0, 4], got {}",
                self.slow_factor
            )));
        }
        if !self.stretch_fft_size.is_power_of_two() || self.stretch_fft_size < 64 {
            return Err(SlowedError::Config(format!(
                "effects.stretch_fft_size must be a power of two >= 64, got {}",
                self.stretch_fft_size
            )));
        }
        if self.stretch_hop == 0 || self.stretch_hop > self.stretch_fft_size / 2 {
            return Err(SlowedError::Config(format!(
                "effects.stretch_hop must be in [1, fft_size/2], got {}",
                self.stretch_hop
            )));
        }
        if self.compressor_ratio < 1.0 {
            return Err(SlowedError::Config("effects.compressor_ratio must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.reverb_wet) {
            return Err(SlowedError::Config("effects.reverb_wet must be in [0, 1]".into()));
        }
        Ok(())
    }
}

/// Discord webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Webhook URL. Unset falls back to `DISCORD_WEBHOOK`; an empty string disables notifications.
    pub discord_webhook: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            discord_webhook: None,
            timeout_seconds: 10,
        }
    }
}

impl NotifySettings {
    /// Resolve the webhook from config or the environment.
    pub fn resolve_webhook(&self) -> Option<String> {
        match &self.discord_webhook {
            Some(w) if w.is_empty() => None,
            Some(w) => Some(w.clone()),
            None => std::env::var("DISCORD_WEBHOOK").ok().filter(|w| !w.is_empty()),
        }
    }
}

/// Seen-set and run log storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Path to the SQLite history database.
    pub sqlite_path: String,
    /// Legacy `uploaded.json` imported on first open, if present.
    pub legacy_json: Option<String>,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.slowed/history.db".to_string(),
            legacy_json: Some("output/uploaded.json".to_string()),
        }
    }
}

/// Pipeline control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of distinct tracks tried before a run gives up.
    pub max_attempts: u32,
    /// Leave intermediate files in the temp directory.
    pub keep_temp: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            keep_temp: false,
        }
    }
}

impl Settings {
    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SlowedError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slowed")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded history database path.
    pub fn history_path(&self) -> PathBuf {
        Self::expand_path(&self.history.sqlite_path)
    }
}
