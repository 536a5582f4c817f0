//! Feed-forward peak compressor.

use std::f64::consts::PI;

/// Smoothing coefficient for a ballistics time constant in milliseconds.
fn time_constant(ms: f64, sample_rate: f64) -> f64 {
    if ms < 1e-3 {
        0.0
    } else {
        (-2.0 * PI * 1000.0 / (ms * sample_rate)).exp()
    }
}

/// Hard-knee compressor with per-channel peak envelope.
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold: f64,
    ratio_inverse: f64,
    attack: f64,
    release: f64,
}

impl Compressor {
    pub fn new(sample_rate: f64, threshold_db: f64, ratio: f64, attack_ms: f64, release_ms: f64) -> Self {
        Self {
            threshold: 10f64.powf(threshold_db / 20.0),
            ratio_inverse: 1.0 / ratio.max(1.0),
            attack: time_constant(attack_ms, sample_rate),
            release: time_constant(release_ms, sample_rate),
        }
    }

    /// Gain for an envelope level.
    #[inline]
    fn gain(&self, env: f64) -> f64 {
        if env < self.threshold {
            1.0
        } else {
            (env / self.threshold).powf(self.ratio_inverse - 1.0)
        }
    }

    /// Compress one channel in place. Each call starts from a fresh envelope.
    pub fn process(&self, samples: &mut [f32]) {
        let mut env = 0.0f64;
        for s in samples.iter_mut() {
            let level = (*s as f64).abs();
            let cte = if level > env { self.attack } else { self.release };
            env = level + cte * (env - level);
            *s = (*s as f64 * self.gain(env)) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_untouched() {
        let comp = Compressor::new(44_100.0, -18.0, 3.0, 5.0, 100.0);
        let mut x: Vec<f32> = (0..1000).map(|i| 0.05 * ((i as f32) * 0.1).sin()).collect();
        let orig = x.clone();
        comp.process(&mut x);
        assert_eq!(x, orig);
    }

    #[test]
    fn test_steady_state_ratio() {
        let comp = Compressor::new(44_100.0, -18.0, 3.0, 5.0, 100.0);
        // 0 dBFS DC, 18 dB over threshold: expect 12 dB of reduction
        let mut x = vec![1.0f32; 44_100];
        comp.process(&mut x);
        let out_db = 20.0 * (x[44_099] as f64).log10();
        assert!((out_db - (-12.0)).abs() < 0.05, "got {out_db}");
    }

    #[test]
    fn test_attack_is_gradual() {
        let comp = Compressor::new(44_100.0, -18.0, 3.0, 5.0, 100.0);
        let mut x = vec![1.0f32; 2000];
        comp.process(&mut x);
        // The envelope needs time to rise, so early samples are reduced less
        assert!(x[0] > x[1999]);
    }
}
