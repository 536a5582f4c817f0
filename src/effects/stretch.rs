//! Pitch-preserving time-stretch with a phase vocoder.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// STFT-based time stretcher.
///
/// `rate` below 1.0 slows down; output length is `len / rate` rounded half to even.
pub struct TimeStretcher {
    n_fft: usize,
    hop: usize,
    window: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl TimeStretcher {
    /// `n_fft` must be even and `hop` in `[1, n_fft]`.
    pub fn new(n_fft: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            n_fft,
            hop,
            window: hann(n_fft),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        }
    }

    fn bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Stretch one channel.
    pub fn process(&self, input: &[f32], rate: f64) -> Vec<f32> {
        let out_len = (input.len() as f64 / rate).round_ties_even() as usize;
        if input.is_empty() || out_len == 0 {
            return vec![0.0; out_len];
        }
        if (rate - 1.0).abs() < f64::EPSILON {
            return input.to_vec();
        }

        let spectra = self.stft(input);
        let stretched = self.phase_vocoder(&spectra, rate);
        self.istft(&stretched, out_len)
    }

    /// Centered STFT: the signal is zero-padded by `n_fft / 2` on both sides.
    fn stft(&self, input: &[f32]) -> Vec<Vec<Complex<f64>>> {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0f64; input.len() + 2 * pad];
        for (dst, src) in padded[pad..].iter_mut().zip(input) {
            *dst = *src as f64;
        }

        let frames = 1 + padded.len().saturating_sub(self.n_fft) / self.hop;
        let mut buf = vec![Complex::new(0.0, 0.0); self.n_fft];

        (0..frames)
            .map(|t| {
                let start = t * self.hop;
                for (i, slot) in buf.iter_mut().enumerate() {
                    *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
                }
                self.forward.process(&mut buf);
                buf[..self.bins()].to_vec()
            })
            .collect()
    }

    fn phase_vocoder(&self, spectra: &[Vec<Complex<f64>>], rate: f64) -> Vec<Vec<Complex<f64>>> {
        let bins = self.bins();
        let frames = spectra.len();
        let zero = vec![Complex::new(0.0, 0.0); bins];
        let column = |t: usize| spectra.get(t).unwrap_or(&zero);

        // Expected phase advance per hop for each bin
        let advance: Vec<f64> = (0..bins)
            .map(|k| 2.0 * PI * self.hop as f64 * k as f64 / self.n_fft as f64)
            .collect();

        let mut phase: Vec<f64> = spectra[0].iter().map(|c| c.arg()).collect();
        let steps = (frames as f64 / rate).ceil() as usize;
        let mut out = Vec::with_capacity(steps);

        for i in 0..steps {
            let step = i as f64 * rate;
            if step >= frames as f64 {
                break;
            }
            let t = step.floor() as usize;
            let alpha = step - t as f64;
            let (c0, c1) = (column(t), column(t + 1));

            let frame: Vec<Complex<f64>> = (0..bins)
                .map(|k| {
                    let mag = (1.0 - alpha) * c0[k].norm() + alpha * c1[k].norm();
                    Complex::from_polar(mag, phase[k])
                })
                .collect();
            out.push(frame);

            for k in 0..bins {
                let mut dphase = c1[k].arg() - c0[k].arg() - advance[k];
                dphase -= 2.0 * PI * (dphase / (2.0 * PI)).round();
                phase[k] += advance[k] + dphase;
            }
        }

        out
    }

    /// Weighted overlap-add inverse of [`TimeStretcher::stft`], trimmed or padded to `length`.
    fn istft(&self, spectra: &[Vec<Complex<f64>>], length: usize) -> Vec<f32> {
        let n = self.n_fft;
        let pad = n / 2;
        let total = n + self.hop * spectra.len().saturating_sub(1);

        let mut signal = vec![0.0f64; total];
        let mut norm = vec![0.0f64; total];
        let mut buf = vec![Complex::new(0.0, 0.0); n];

        for (t, half) in spectra.iter().enumerate() {
            buf[..half.len()].copy_from_slice(half);
            // Hermitian mirror for a real-valued frame
            for k in 1..n - half.len() + 1 {
                buf[n - k] = half[k].conj();
            }
            self.inverse.process(&mut buf);

            let start = t * self.hop;
            for i in 0..n {
                let w = self.window[i];
                signal[start + i] += buf[i].re / n as f64 * w;
                norm[start + i] += w * w;
            }
        }

        (0..length)
            .map(|i| {
                let j = i + pad;
                match (signal.get(j), norm.get(j)) {
                    (Some(s), Some(w)) if *w > 1e-10 => (s / w) as f32,
                    (Some(s), Some(_)) => *s as f32,
                    _ => 0.0,
                }
            })
            .collect()
    }
}

/// Periodic Hann window.
fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Stretch a channel with a one-off stretcher.
pub fn time_stretch(input: &[f32], rate: f64, n_fft: usize, hop: usize) -> Vec<f32> {
    TimeStretcher::new(n_fft, hop).process(input, rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sr: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sr).sin() as f32 * 0.5)
            .collect()
    }

    /// Dominant frequency by counting upward zero crossings.
    fn zero_cross_freq(x: &[f32], sr: f64) -> f64 {
        let crossings = x.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        crossings as f64 * sr / x.len() as f64
    }

    #[test]
    fn test_output_length() {
        let x = sine(440.0, 44_100.0, 44_100);
        let y = time_stretch(&x, 0.8, 2048, 512);
        assert_eq!(y.len(), 55_125);

        let y = time_stretch(&x[..1001], 0.8, 2048, 512);
        assert_eq!(y.len(), 1251);
    }

    #[test]
    fn test_half_sample_lengths_round_to_even() {
        let x = sine(100.0, 8_000.0, 30);
        assert_eq!(time_stretch(&x[..10], 0.8, 64, 16).len(), 12);
        assert_eq!(time_stretch(&x, 0.8, 64, 16).len(), 38);
    }

    #[test]
    fn test_pitch_is_preserved() {
        let sr = 44_100.0;
        let x = sine(440.0, sr, 44_100);
        let y = time_stretch(&x, 0.8, 2048, 512);

        // Ignore edges where the window is ramping
        let middle = &y[4096..y.len() - 4096];
        let freq = zero_cross_freq(middle, sr);
        assert!((freq - 440.0).abs() < 10.0, "got {freq} Hz");

        let rms = (middle.iter().map(|s| s * s).sum::<f32>() / middle.len() as f32).sqrt();
        assert!((rms - 0.5 / 2f32.sqrt()).abs() < 0.08, "rms {rms}");
    }

    #[test]
    fn test_unit_rate_and_empty() {
        let x = sine(100.0, 8_000.0, 500);
        assert_eq!(time_stretch(&x, 1.0, 256, 64), x);
        assert!(time_stretch(&[], 0.8, 256, 64).is_empty());
    }

    #[test]
    fn test_silence_stays_silent() {
        let y = time_stretch(&vec![0.0; 10_000], 0.8, 1024, 256);
        assert_eq!(y.len(), 12_500);
        assert!(y.iter().all(|s| s.abs() < 1e-9));
    }
}
