//! Integrated loudness (ITU-R BS.1770-4) and normalization.

use super::biquad::Biquad;
use super::wav::StereoBuffer;

const BLOCK_SECONDS: f64 = 0.4;
const OVERLAP: f64 = 0.75;
const ABSOLUTE_GATE: f64 = -70.0;
const RELATIVE_GATE: f64 = -10.0;

/// Loudness below this is treated as silence and never normalized.
pub const SILENCE_LUFS: f64 = -70.0;

fn block_loudness(power: f64) -> f64 {
    -0.691 + 10.0 * power.log10()
}

/// K-weighting: a +4 dB high shelf at 1.5 kHz followed by a 38 Hz high-pass.
fn k_weighted(samples: &[f32], sample_rate: f64) -> Vec<f64> {
    let mut shelf = Biquad::high_shelf(sample_rate, 1500.0, std::f64::consts::FRAC_1_SQRT_2, 4.0);
    let mut high_pass = Biquad::high_pass(sample_rate, 38.0, 0.5);
    samples
        .iter()
        .map(|s| high_pass.process(shelf.process(*s as f64)))
        .collect()
}

/// Measure integrated loudness in LUFS.
///
/// Returns negative infinity for silence or input shorter than one 400 ms block.
pub fn integrated_loudness(buffer: &StereoBuffer) -> f64 {
    let sr = buffer.sample_rate as f64;
    let len = buffer.len();
    let block_len = BLOCK_SECONDS * sr;
    if sr <= 0.0 || (len as f64) < block_len {
        return f64::NEG_INFINITY;
    }

    let channels = [k_weighted(&buffer.left, sr), k_weighted(&buffer.right, sr)];

    let step = 1.0 - OVERLAP;
    let duration = len as f64 / sr;
    let blocks = ((duration - BLOCK_SECONDS) / (BLOCK_SECONDS * step)).round() as usize + 1;

    // Mean square per channel per block
    let z: Vec<[f64; 2]> = (0..blocks)
        .map(|j| {
            let lo = (BLOCK_SECONDS * (j as f64 * step) * sr) as usize;
            let hi = ((BLOCK_SECONDS * (j as f64 * step + 1.0) * sr) as usize).min(len);
            let mut ms = [0.0; 2];
            for (c, ch) in channels.iter().enumerate() {
                let sum: f64 = ch[lo.min(hi)..hi].iter().map(|x| x * x).sum();
                ms[c] = sum / block_len;
            }
            ms
        })
        .collect();

    let loudness: Vec<f64> = z.iter().map(|b| block_loudness(b[0] + b[1])).collect();

    let gated_mean = |keep: &dyn Fn(f64) -> bool| -> f64 {
        let mut sum = [0.0; 2];
        let mut count = 0usize;
        for (b, l) in z.iter().zip(&loudness) {
            if keep(*l) {
                sum[0] += b[0];
                sum[1] += b[1];
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            (sum[0] + sum[1]) / count as f64
        }
    };

    let absolute = gated_mean(&|l| l >= ABSOLUTE_GATE);
    let relative_gate = block_loudness(absolute) + RELATIVE_GATE;
    let power = gated_mean(&|l| l > relative_gate && l > ABSOLUTE_GATE);

    block_loudness(power)
}

/// Scale to `target_lufs` from a `measured` loudness. Returns the applied gain in dB.
///
/// Nothing is applied when `measured` is at or below [`SILENCE_LUFS`].
pub fn normalize_loudness(buffer: &mut StereoBuffer, measured: f64, target_lufs: f64) -> f64 {
    if measured.is_nan() || measured <= SILENCE_LUFS {
        return 0.0;
    }
    let gain_db = target_lufs - measured;
    buffer.scale(10f64.powf(gain_db / 20.0) as f32);
    gain_db
}

/// Scale so the absolute peak equals `target`. Returns the applied gain in dB.
///
/// Silent buffers are left untouched.
pub fn normalize_peak(buffer: &mut StereoBuffer, target: f32) -> f64 {
    let peak = buffer.peak();
    if peak <= 0.0 {
        return 0.0;
    }
    let gain = target / peak;
    buffer.scale(gain);
    20.0 * (gain as f64).log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, amp: f64, sr: u32, seconds: f64) -> StereoBuffer {
        let n = (sr as f64 * seconds) as usize;
        let x: Vec<f32> = (0..n)
            .map(|i| (amp * (2.0 * PI * freq * i as f64 / sr as f64).sin()) as f32)
            .collect();
        StereoBuffer::from_mono(sr, x)
    }

    #[test]
    fn test_full_scale_1k_sine() {
        // A stereo 997 Hz sine at -3.01 dBFS per channel reads close to -3 LUFS
        let buf = sine(997.0, 10f64.powf(-3.01 / 20.0), 48_000, 5.0);
        let lufs = integrated_loudness(&buf);
        assert!((lufs - (-3.0)).abs() < 0.3, "got {lufs}");
    }

    #[test]
    fn test_silence_and_short_input() {
        let silent = StereoBuffer::from_mono(44_100, vec![0.0; 44_100]);
        assert_eq!(integrated_loudness(&silent), f64::NEG_INFINITY);

        let short = sine(440.0, 0.5, 44_100, 0.1);
        assert_eq!(integrated_loudness(&short), f64::NEG_INFINITY);
    }

    #[test]
    fn test_normalize_reaches_target() {
        let mut buf = sine(1000.0, 0.1, 44_100, 4.0);
        let before = integrated_loudness(&buf);
        let gain = normalize_loudness(&mut buf, before, -14.0);
        assert!((gain - (-14.0 - before)).abs() < 1e-9);

        let after = integrated_loudness(&buf);
        assert!((after - (-14.0)).abs() < 0.05, "got {after}");
    }

    #[test]
    fn test_silence_is_not_normalized() {
        let mut buf = StereoBuffer::from_mono(44_100, vec![0.0; 44_100]);
        assert_eq!(normalize_loudness(&mut buf, f64::NEG_INFINITY, -14.0), 0.0);
        assert_eq!(normalize_peak(&mut buf, 0.9), 0.0);
    }

    #[test]
    fn test_normalize_peak() {
        let mut buf = StereoBuffer::new(44_100, vec![0.1, -0.45], vec![0.2, 0.3]);
        normalize_peak(&mut buf, 0.9);
        assert!((buf.peak() - 0.9).abs() < 1e-6);
        assert!((buf.left[0] - 0.2).abs() < 1e-6);
    }
}
