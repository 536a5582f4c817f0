//! WAV input/output with hound.

use crate::error::{Result, SlowedError};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

/// Planar stereo audio at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBuffer {
    pub sample_rate: u32,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoBuffer {
    pub fn new(sample_rate: u32, left: Vec<f32>, right: Vec<f32>) -> Self {
        Self {
            sample_rate,
            left,
            right,
        }
    }

    /// Same signal on both channels.
    pub fn from_mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, samples.clone(), samples)
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Absolute sample peak across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Multiply every sample by `gain`.
    pub fn scale(&mut self, gain: f32) {
        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s *= gain;
        }
    }

    pub fn channels_mut(&mut self) -> [&mut Vec<f32>; 2] {
        [&mut self.left, &mut self.right]
    }
}

/// Read a PCM or float WAV into a stereo buffer.
///
/// Mono is duplicated to both channels. With more than two channels, only the
/// first two are kept.
pub fn read_wav(path: &Path) -> Result<StereoBuffer> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    if channels == 0 {
        return Err(SlowedError::InvalidInput(format!("{:?} has no channels", path)));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    debug!(
        "Read {:?}: {} Hz, {} ch, {} bit",
        path, spec.sample_rate, channels, spec.bits_per_sample
    );

    let frames = interleaved.len() / channels;
    let left: Vec<f32> = (0..frames).map(|i| interleaved[i * channels]).collect();

    if channels == 1 {
        return Ok(StereoBuffer::from_mono(spec.sample_rate, left));
    }

    let right = (0..frames).map(|i| interleaved[i * channels + 1]).collect();
    Ok(StereoBuffer::new(spec.sample_rate, left, right))
}

/// Write a stereo buffer as 24-bit PCM WAV. Samples are clipped to [-1, 1].
pub fn write_wav_24(path: &Path, buffer: &StereoBuffer) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = WavSpec {
        channels: 2,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 24,
        sample_format: SampleFormat::Int,
    };

    const FULL_SCALE: f32 = 8_388_607.0;
    let mut writer = WavWriter::create(path, spec)?;
    for (l, r) in buffer.left.iter().zip(buffer.right.iter()) {
        writer.write_sample((l.clamp(-1.0, 1.0) * FULL_SCALE).round() as i32)?;
        writer.write_sample((r.clamp(-1.0, 1.0) * FULL_SCALE).round() as i32)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_i16(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut w = WavWriter::create(path, spec).unwrap();
        for s in samples {
            w.write_sample(*s).unwrap();
        }
        w.finalize().unwrap();
    }

    #[test]
    fn test_mono_is_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_i16(&path, 1, &[0, 16384, -16384]);

        let buf = read_wav(&path).unwrap();
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.left, buf.right);
        assert!((buf.left[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_extra_channels_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.wav");
        write_i16(&path, 4, &[100, 200, 300, 400, 500, 600, 700, 800]);

        let buf = read_wav(&path).unwrap();
        assert_eq!(buf.len(), 2);
        assert!((buf.left[1] * 32768.0 - 500.0).abs() < 1e-3);
        assert!((buf.right[1] * 32768.0 - 600.0).abs() < 1e-3);
    }

    #[test]
    fn test_write_24_bit_clips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let buf = StereoBuffer::new(48_000, vec![0.25, 2.0], vec![-0.25, -2.0]);
        write_wav_24(&path, &buf).unwrap();

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 24);
        assert_eq!(reader.spec().sample_rate, 48_000);

        let back = read_wav(&path).unwrap();
        assert!((back.left[0] - 0.25).abs() < 1e-4);
        assert!(back.left[1] <= 1.0 && back.left[1] > 0.999);
        assert!(back.right[1] >= -1.0 && back.right[1] < -0.999);
    }
}
