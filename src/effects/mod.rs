//! The slowed + reverb processing chain.
//!
//! Stages run in a fixed order: time-stretch, compressor, low shelf, high
//! shelf, reverb, loudness normalization and fades. Audio is handled as
//! planar stereo `f32`.

mod biquad;
mod compressor;
mod fade;
mod loudness;
mod reverb;
mod stretch;
mod wav;

pub use biquad::{Biquad, Q_BUTTERWORTH};
pub use compressor::Compressor;
pub use fade::{fade_in, fade_out, fade_samples};
pub use loudness::{integrated_loudness, normalize_loudness, normalize_peak, SILENCE_LUFS};
pub use reverb::{Reverb, ReverbParams};
pub use stretch::{time_stretch, TimeStretcher};
pub use wav::{read_wav, write_wav_24, StereoBuffer};

use crate::audio::{encode_mp3, Mp3Tags};
use crate::config::{EffectsSettings, LoudnessMode};
use crate::error::{Result, SlowedError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Summary of one processed file.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub output_path: PathBuf,
    pub input_seconds: f64,
    pub output_seconds: f64,
    /// Loudness before normalization; `None` in peak mode or for silence.
    pub measured_lufs: Option<f64>,
    pub gain_db: f64,
    pub peak: f32,
}

/// Loudness step outcome.
#[derive(Debug, Clone, Copy)]
struct LoudnessOutcome {
    measured_lufs: Option<f64>,
    gain_db: f64,
}

/// The configured effect chain.
#[derive(Debug, Clone)]
pub struct EffectChain {
    settings: EffectsSettings,
}

impl EffectChain {
    pub fn new(settings: EffectsSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &EffectsSettings {
        &self.settings
    }

    fn reverb_params(&self) -> ReverbParams {
        let s = &self.settings;
        ReverbParams {
            room_size: s.reverb_room_size,
            damping: s.reverb_damping,
            wet: s.reverb_wet,
            dry: s.reverb_dry(),
            width: s.reverb_width,
            freeze: s.reverb_freeze,
        }
    }

    /// Stretch both channels.
    fn slow_down(&self, buffer: StereoBuffer) -> StereoBuffer {
        let s = &self.settings;
        let rate = s.slow_factor;
        let stretcher = TimeStretcher::new(s.stretch_fft_size, s.stretch_hop);
        debug!("Time-stretching at {:.2}x", rate);

        StereoBuffer::new(
            buffer.sample_rate,
            stretcher.process(&buffer.left, rate),
            stretcher.process(&buffer.right, rate),
        )
    }

    /// Compressor, shelves and reverb.
    fn color(&self, buffer: &mut StereoBuffer) {
        let s = &self.settings;
        let sr = buffer.sample_rate as f64;

        let compressor = Compressor::new(
            sr,
            s.compressor_threshold_db as f64,
            s.compressor_ratio as f64,
            s.compressor_attack_ms as f64,
            s.compressor_release_ms as f64,
        );

        for channel in buffer.channels_mut() {
            compressor.process(channel);
            Biquad::low_shelf(sr, s.low_shelf_hz as f64, Q_BUTTERWORTH, s.low_shelf_gain_db as f64)
                .process_buffer(channel);
            Biquad::high_shelf(sr, s.high_shelf_hz as f64, Q_BUTTERWORTH, s.high_shelf_gain_db as f64)
                .process_buffer(channel);
        }

        let mut reverb = Reverb::new(buffer.sample_rate, self.reverb_params());
        reverb.process(&mut buffer.left, &mut buffer.right);
    }

    fn level(&self, buffer: &mut StereoBuffer) -> LoudnessOutcome {
        match self.settings.loudness_mode {
            LoudnessMode::Lufs => {
                let measured = integrated_loudness(buffer);
                let gain_db = normalize_loudness(buffer, measured, self.settings.target_lufs);
                debug!("Measured {:.2} LUFS, applied {:+.2} dB", measured, gain_db);
                LoudnessOutcome {
                    measured_lufs: (measured > SILENCE_LUFS).then_some(measured),
                    gain_db,
                }
            }
            LoudnessMode::Peak => LoudnessOutcome {
                measured_lufs: None,
                gain_db: normalize_peak(buffer, self.settings.peak_target),
            },
        }
    }

    fn fade(&self, buffer: &mut StereoBuffer) {
        let (sr, len) = (buffer.sample_rate, buffer.len());
        let fade_in_len = fade_samples(self.settings.fade_in_ms, sr, len);
        let fade_out_len = fade_samples(self.settings.fade_out_ms, sr, len);

        for channel in buffer.channels_mut() {
            fade_in(channel, fade_in_len);
            fade_out(channel, fade_out_len);
        }
    }

    /// Run every stage on an in-memory buffer.
    fn apply(&self, buffer: StereoBuffer) -> (StereoBuffer, LoudnessOutcome) {
        let mut out = self.slow_down(buffer);
        self.color(&mut out);
        let loudness = self.level(&mut out);
        self.fade(&mut out);
        (out, loudness)
    }

    /// Run the chain on a buffer, returning the processed audio.
    pub fn process(&self, buffer: StereoBuffer) -> StereoBuffer {
        self.apply(buffer).0
    }

    /// Process a WAV file into `output`.
    ///
    /// A `.wav` output is written directly as 24-bit PCM. Anything else gets a
    /// 24-bit intermediate next to it and is encoded to MP3 with `ffmpeg`.
    #[instrument(skip(self, tags, ffmpeg))]
    pub async fn process_file(
        &self,
        input: &Path,
        output: &Path,
        tags: &Mp3Tags,
        ffmpeg: &str,
    ) -> Result<ProcessReport> {
        let is_wav = output
            .extension()
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);

        let wav_path = if is_wav {
            output.to_path_buf()
        } else {
            output.with_extension("processed.wav")
        };

        let chain = self.clone();
        let src = input.to_path_buf();
        let dst = wav_path.clone();

        let (input_seconds, output_seconds, peak, loudness) =
            tokio::task::spawn_blocking(move || {
                let buffer = read_wav(&src)?;
                if buffer.is_empty() {
                    return Err(SlowedError::Effects(format!("{:?} contains no audio", src)));
                }
                let input_seconds = buffer.duration_seconds();
                let (processed, loudness) = chain.apply(buffer);
                write_wav_24(&dst, &processed)?;
                Ok::<_, SlowedError>((
                    input_seconds,
                    processed.duration_seconds(),
                    processed.peak(),
                    loudness,
                ))
            })
            .await
            .map_err(|e| SlowedError::Effects(format!("processing task failed: {e}")))??;

        if !is_wav {
            encode_mp3(
                ffmpeg,
                &wav_path,
                output,
                self.settings.mp3_bitrate_kbps,
                tags,
            )
            .await?;
            if let Err(e) = std::fs::remove_file(&wav_path) {
                debug!("Could not remove {:?}: {}", wav_path, e);
            }
        }

        let report = ProcessReport {
            output_path: output.to_path_buf(),
            input_seconds,
            output_seconds,
            measured_lufs: loudness.measured_lufs,
            gain_db: loudness.gain_db,
            peak,
        };

        let size_mb = std::fs::metadata(output)
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);
        info!(
            "Done: {:?} ({:.1}s -> {:.1}s, {:.1} MB)",
            output.file_name().unwrap_or_default(),
            report.input_seconds,
            report.output_seconds,
            size_mb
        );

        Ok(report)
    }
}

/// Output file name for a processed track.
pub fn output_file_name(video_id: &str) -> String {
    format!("{video_id}_slowed_reverb.mp3")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(sr: u32, seconds: f64) -> StereoBuffer {
        let n = (sr as f64 * seconds) as usize;
        let x = (0..n)
            .map(|i| (0.3 * (2.0 * PI * 220.0 * i as f64 / sr as f64).sin()) as f32)
            .collect();
        StereoBuffer::from_mono(sr, x)
    }

    fn quick_settings() -> EffectsSettings {
        EffectsSettings {
            stretch_fft_size: 512,
            stretch_hop: 128,
            fade_in_ms: 200,
            fade_out_ms: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_chain_slows_and_normalizes() {
        let chain = EffectChain::new(quick_settings()).unwrap();
        let input = tone(22_050, 3.0);
        let (out, loudness) = chain.apply(input.clone());

        // 66150 / 0.8 lands exactly on a half sample
        assert_eq!(out.len(), 82_688);
        assert!(loudness.measured_lufs.is_some());
        // Fades pull the edges down to silence
        assert!(out.left[0].abs() < 1e-4);
        assert!(out.right[out.len() - 1].abs() < 1e-4);

        let lufs = integrated_loudness(&out);
        assert!((lufs - (-14.0)).abs() < 1.0, "got {lufs}");
    }

    #[test]
    fn test_silence_passes_through() {
        let chain = EffectChain::new(quick_settings()).unwrap();
        let (out, loudness) = chain.apply(StereoBuffer::from_mono(22_050, vec![0.0; 22_050]));
        assert_eq!(loudness.gain_db, 0.0);
        assert!(loudness.measured_lufs.is_none());
        assert_eq!(out.peak(), 0.0);
    }

    #[test]
    fn test_peak_mode() {
        let settings = EffectsSettings {
            loudness_mode: LoudnessMode::Peak,
            fade_in_ms: 0,
            fade_out_ms: 0,
            ..quick_settings()
        };
        let chain = EffectChain::new(settings).unwrap();
        let (out, loudness) = chain.apply(tone(22_050, 2.0));
        assert!(loudness.measured_lufs.is_none());
        assert!((out.peak() - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = EffectsSettings {
            stretch_hop: 0,
            ..Default::default()
        };
        assert!(EffectChain::new(settings).is_err());
    }

    #[tokio::test]
    async fn test_process_file_to_wav() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        write_wav_24(&input, &tone(22_050, 2.0)).unwrap();

        let chain = EffectChain::new(quick_settings()).unwrap();
        let report = chain
            .process_file(&input, &output, &Mp3Tags::default(), "ffmpeg")
            .await
            .unwrap();

        assert!(output.exists());
        assert!((report.input_seconds - 2.0).abs() < 1e-6);
        assert!((report.output_seconds - 2.5).abs() < 1e-3);
        assert!(report.peak <= 1.0);
    }

    #[tokio::test]
    async fn test_process_file_writes_wav_before_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.mp3");
        write_wav_24(&input, &tone(22_050, 2.0)).unwrap();

        let chain = EffectChain::new(quick_settings()).unwrap();
        let err = chain
            .process_file(&input, &output, &Mp3Tags::default(), "slowed-missing-ffmpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, SlowedError::ToolNotFound(_)));

        let staged = read_wav(&dir.path().join("out.processed.wav")).unwrap();
        assert!((staged.duration_seconds() - 2.5).abs() < 1e-3);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_process_file_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.wav");
        write_wav_24(&input, &StereoBuffer::new(44_100, vec![], vec![])).unwrap();

        let chain = EffectChain::new(quick_settings()).unwrap();
        let err = chain
            .process_file(&input, &dir.path().join("o.wav"), &Mp3Tags::default(), "ffmpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, SlowedError::Effects(_)));
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("abc"), "abc_slowed_reverb.mp3");
    }
}
