//! Pipeline orchestrator for Slowed.
//!
//! Coordinates a run from track selection to the finished edit.

use crate::audio::{AudioFetcher, Downloader, Mp3Tags};
use crate::cleanup::{cleanup_temp_files, safe_filename, DEFAULT_FILENAME_LEN};
use crate::config::Settings;
use crate::effects::{output_file_name, EffectChain, ProcessReport};
use crate::error::{Result, SlowedError};
use crate::history::{import_legacy_json, HistoryStore, MemoryHistory, RunRecord, SqliteHistory};
use crate::notify::DiscordNotifier;
use crate::source::{Candidate, SelectionRules, Track, TrackSelector, TrackSource, YoutubeApi};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub track: Track,
    pub output_path: PathBuf,
    pub report: ProcessReport,
}

/// Open the configured history database and import any legacy seen list.
pub async fn open_history(settings: &Settings) -> Result<Arc<dyn HistoryStore>> {
    let store = Arc::new(SqliteHistory::new(&settings.history_path())?);

    if let Some(legacy) = settings.history.legacy_json.as_deref() {
        let path = Settings::expand_path(legacy);
        if let Err(e) = import_legacy_json(store.as_ref(), &path).await {
            warn!("Could not import {:?}: {}", path, e);
        }
    }

    Ok(store)
}

/// The main orchestrator for the Slowed pipeline.
pub struct Pipeline {
    settings: Settings,
    selector: TrackSelector,
    history: Arc<dyn HistoryStore>,
    fetcher: Arc<dyn AudioFetcher>,
    chain: EffectChain,
    notifier: DiscordNotifier,
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl Pipeline {
    /// Create a pipeline backed by the YouTube API, yt-dlp and the history database.
    pub async fn new(settings: Settings) -> Result<Self> {
        let source: Arc<dyn TrackSource> = Arc::new(YoutubeApi::from_settings(&settings.youtube)?);
        let history = open_history(&settings).await?;
        let fetcher: Arc<dyn AudioFetcher> = Arc::new(Downloader::from_settings(&settings.download));
        Self::with_components(settings, source, history, fetcher)
    }

    /// Create a pipeline for local processing only.
    ///
    /// No API key is needed and the history database is left untouched.
    /// Track selection fails with a configuration error.
    pub fn offline(settings: Settings) -> Result<Self> {
        let fetcher: Arc<dyn AudioFetcher> = Arc::new(Downloader::from_settings(&settings.download));
        Self::with_components(
            settings,
            Arc::new(NoSource),
            Arc::new(MemoryHistory::new()),
            fetcher,
        )
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        source: Arc<dyn TrackSource>,
        history: Arc<dyn HistoryStore>,
        fetcher: Arc<dyn AudioFetcher>,
    ) -> Result<Self> {
        let chain = EffectChain::new(settings.effects.clone())?;
        let selector = TrackSelector::new(
            source,
            history.clone(),
            SelectionRules::from(&settings.youtube),
        );
        let notifier = DiscordNotifier::from_settings(&settings.notify);

        let temp_dir = settings.temp_dir();
        let output_dir = settings.output_dir();
        std::fs::create_dir_all(&temp_dir)?;
        std::fs::create_dir_all(&output_dir)?;

        Ok(Self {
            settings,
            selector,
            history,
            fetcher,
            chain,
            notifier,
            temp_dir,
            output_dir,
        })
    }

    /// Select a trending track and turn it into a slowed + reverb edit.
    ///
    /// A failing track is recorded and the next one is tried, up to
    /// `pipeline.max_attempts` distinct tracks. The temp directory is cleaned
    /// afterwards unless `pipeline.keep_temp` is set.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<PipelineResult> {
        let result = self.run_attempts().await;

        match &result {
            Ok(done) => {
                self.notifier
                    .success(
                        "Slowed + reverb ready",
                        &format!(
                            "**{}** by {}\n{}",
                            done.track.title,
                            done.track.artist,
                            done.output_path.display()
                        ),
                    )
                    .await;
            }
            Err(e) => {
                error!("Pipeline failed: {}", e);
                self.notifier.error("Pipeline failed", &e.to_string()).await;
            }
        }

        self.cleanup();
        result
    }

    async fn run_attempts(&self) -> Result<PipelineResult> {
        let max_attempts = self.settings.pipeline.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let Some(track) = self.selector.select().await? else {
                break;
            };
            info!(
                "Attempt {}/{}: {} - {} ({})",
                attempt,
                max_attempts,
                track.artist,
                track.title,
                track.format_duration()
            );

            let started = Utc::now();
            match self.produce(&track).await {
                Ok((output_path, report)) => {
                    let record = RunRecord::succeeded(
                        &track.video_id,
                        &track.title,
                        &track.artist,
                        &output_path,
                        started,
                    );
                    self.record(&record).await;
                    return Ok(PipelineResult {
                        track,
                        output_path,
                        report,
                    });
                }
                Err(e) => {
                    warn!("Track {} failed: {}", track.video_id, e);
                    let record = RunRecord::failed(
                        &track.video_id,
                        &track.title,
                        &track.artist,
                        &e.to_string(),
                        started,
                    );
                    self.record(&record).await;

                    // Missing tools fail every track the same way
                    if matches!(e, SlowedError::ToolNotFound(_)) {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }

            if !self.settings.pipeline.keep_temp {
                cleanup_temp_files(&self.temp_dir);
            }
        }

        Err(last_error.unwrap_or(SlowedError::NoTrack))
    }

    /// Download, process and publish one track to the output directory.
    async fn produce(&self, track: &Track) -> Result<(PathBuf, ProcessReport)> {
        let wav = self.fetcher.fetch_wav(track, &self.temp_dir).await?;

        let name = output_file_name(&track.video_id);
        let staged = self.temp_dir.join(&name);
        let tags = Mp3Tags::slowed_reverb(&track.title, &track.artist);
        let mut report = self
            .chain
            .process_file(&wav, &staged, &tags, &self.settings.download.ffmpeg_bin)
            .await?;

        let final_path = self.output_dir.join(&name);
        move_file(&staged, &final_path)?;
        report.output_path = final_path.clone();

        Ok((final_path, report))
    }

    /// Run only the effects chain on a local media file.
    ///
    /// Non-WAV input is transcoded first. Without `output`, the edit is written
    /// to the output directory under a name derived from the input file.
    #[instrument(skip(self))]
    pub async fn process_local(
        &self,
        input: &Path,
        title: Option<&str>,
        artist: Option<&str>,
        output: Option<&Path>,
    ) -> Result<ProcessReport> {
        if !input.is_file() {
            return Err(SlowedError::InvalidInput(format!("{:?} is not a file", input)));
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "track".to_string());
        let title = title.unwrap_or(&stem);
        let artist = artist.unwrap_or("Unknown Artist");

        let is_wav = input
            .extension()
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);

        let wav = if is_wav {
            input.to_path_buf()
        } else {
            let dst = self
                .temp_dir
                .join(format!("{}_local.wav", safe_filename(&stem, DEFAULT_FILENAME_LEN)));
            self.fetcher.transcode_to_wav(input, &dst).await?;
            dst
        };

        let output = match output {
            Some(o) => o.to_path_buf(),
            None => self
                .output_dir
                .join(output_file_name(&safe_filename(&stem, DEFAULT_FILENAME_LEN))),
        };

        let tags = Mp3Tags::slowed_reverb(title, artist);
        let result = self
            .chain
            .process_file(&wav, &output, &tags, &self.settings.download.ffmpeg_bin)
            .await;

        if !is_wav && !self.settings.pipeline.keep_temp {
            if let Err(e) = std::fs::remove_file(&wav) {
                debug!("Could not remove {:?}: {}", wav, e);
            }
        }
        result
    }

    async fn record(&self, record: &RunRecord) {
        if let Err(e) = self.history.record_run(record).await {
            warn!("Failed to record run: {}", e);
        }
    }

    fn cleanup(&self) {
        if self.settings.pipeline.keep_temp {
            info!("Keeping temp files in {:?}", self.temp_dir);
            return;
        }
        cleanup_temp_files(&self.temp_dir);
    }
}

/// Track source for pipelines that never select.
struct NoSource;

#[async_trait]
impl TrackSource for NoSource {
    async fn chart(&self) -> Result<Vec<Candidate>> {
        Err(SlowedError::Config("no track source configured".to_string()))
    }

    async fn search(&self, _query: &str) -> Result<Vec<Candidate>> {
        Err(SlowedError::Config("no track source configured".to_string()))
    }
}

/// Move a file, falling back to copy + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)?;
    Ok(())
}
