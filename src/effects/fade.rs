//! Fade-in/fade-out envelopes.

/// Amplitude at the silent end of a fade (-120 dB).
const FLOOR_GAIN: f64 = 1e-6;

/// Gain at `position` of a `length`-sample fade, ramping linearly in amplitude from the floor to unity.
fn ramp_gain(position: usize, length: usize) -> f32 {
    (FLOOR_GAIN + (1.0 - FLOOR_GAIN) * position as f64 / length as f64) as f32
}

/// Number of samples for a fade of `ms` milliseconds, clamped to `len`.
pub fn fade_samples(ms: u32, sample_rate: u32, len: usize) -> usize {
    ((ms as u64 * sample_rate as u64 / 1000) as usize).min(len)
}

pub fn fade_in(samples: &mut [f32], length: usize) {
    let length = length.min(samples.len());
    for (i, s) in samples[..length].iter_mut().enumerate() {
        *s *= ramp_gain(i, length);
    }
}

pub fn fade_out(samples: &mut [f32], length: usize) {
    let length = length.min(samples.len());
    let start = samples.len() - length;
    for (i, s) in samples[start..].iter_mut().enumerate() {
        *s *= ramp_gain(length - 1 - i, length);
    }
}
