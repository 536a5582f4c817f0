//! Second-order IIR sections (RBJ cookbook).

use std::f64::consts::PI;

/// Butterworth Q.
pub const Q_BUTTERWORTH: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Direct form I biquad with normalized coefficients.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

struct Design {
    a: f64,
    cos_w0: f64,
    alpha: f64,
}

impl Design {
    fn new(sample_rate: f64, freq: f64, q: f64, gain_db: f64) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        Self {
            a: 10f64.powf(gain_db / 40.0),
            cos_w0: w0.cos(),
            alpha: w0.sin() / (2.0 * q),
        }
    }
}

impl Biquad {
    fn from_coefficients(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        Self {
            b0: b[0] / a0,
            b1: b[1] / a0,
            b2: b[2] / a0,
            a1: a[1] / a0,
            a2: a[2] / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Boost or cut below `freq`.
    pub fn low_shelf(sample_rate: f64, freq: f64, q: f64, gain_db: f64) -> Self {
        let Design { a, cos_w0: c, alpha } = Design::new(sample_rate, freq, q, gain_db);
        let s = 2.0 * a.sqrt() * alpha;
        Self::from_coefficients(
            [
                a * ((a + 1.0) - (a - 1.0) * c + s),
                2.0 * a * ((a - 1.0) - (a + 1.0) * c),
                a * ((a + 1.0) - (a - 1.0) * c - s),
            ],
            [
                (a + 1.0) + (a - 1.0) * c + s,
                -2.0 * ((a - 1.0) + (a + 1.0) * c),
                (a + 1.0) + (a - 1.0) * c - s,
            ],
        )
    }

    /// Boost or cut above `freq`.
    pub fn high_shelf(sample_rate: f64, freq: f64, q: f64, gain_db: f64) -> Self {
        let Design { a, cos_w0: c, alpha } = Design::new(sample_rate, freq, q, gain_db);
        let s = 2.0 * a.sqrt() * alpha;
        Self::from_coefficients(
            [
                a * ((a + 1.0) + (a - 1.0) * c + s),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * c),
                a * ((a + 1.0) + (a - 1.0) * c - s),
            ],
            [
                (a + 1.0) - (a - 1.0) * c + s,
                2.0 * ((a - 1.0) - (a + 1.0) * c),
                (a + 1.0) - (a - 1.0) * c - s,
            ],
        )
    }

    pub fn high_pass(sample_rate: f64, freq: f64, q: f64) -> Self {
        let Design { cos_w0: c, alpha, .. } = Design::new(sample_rate, freq, q, 0.0);
        Self::from_coefficients(
            [(1.0 + c) / 2.0, -(1.0 + c), (1.0 + c) / 2.0],
            [1.0 + alpha, -2.0 * c, 1.0 - alpha],
        )
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Filter a channel in place.
    pub fn process_buffer(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s as f64) as f32;
        }
    }

    /// Magnitude response in dB at `freq`.
    pub fn response_db(&self, sample_rate: f64, freq: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let z1 = num_complex::Complex::from_polar(1.0, -w);
        let z2 = z1 * z1;
        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        20.0 * (num / den).norm().log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44_100.0;

    #[test]
    fn test_low_shelf_response() {
        let f = Biquad::low_shelf(SR, 200.0, Q_BUTTERWORTH, 3.0);
        assert!((f.response_db(SR, 20.0) - 3.0).abs() < 0.2);
        assert!((f.response_db(SR, 200.0) - 1.5).abs() < 0.1);
        assert!(f.response_db(SR, 10_000.0).abs() < 0.05);
    }

    #[test]
    fn test_high_shelf_response() {
        let f = Biquad::high_shelf(SR, 8000.0, Q_BUTTERWORTH, -2.5);
        assert!((f.response_db(SR, 20_000.0) + 2.5).abs() < 0.3);
        assert!(f.response_db(SR, 100.0).abs() < 0.05);
    }

    #[test]
    fn test_high_pass_blocks_dc() {
        let mut f = Biquad::high_pass(SR, 38.0, 0.5);
        let mut last = 1.0;
        for _ in 0..44_100 {
            last = f.process(1.0);
        }
        assert!(last.abs() < 1e-3);
    }

    #[test]
    fn test_process_buffer_matches_gain() {
        let mut f = Biquad::low_shelf(SR, 200.0, Q_BUTTERWORTH, 6.0);
        let mut dc = vec![0.5f32; 20_000];
        f.process_buffer(&mut dc);
        let expected = 0.5 * 10f32.powf(6.0 / 20.0);
        assert!((dc[19_999] - expected).abs() < 1e-3);
    }
}
