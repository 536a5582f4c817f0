//! Stereo room reverb on top of the `freeverb` crate.

use freeverb::Freeverb;

/// User-facing reverb parameters, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    pub room_size: f32,
    pub damping: f32,
    pub wet: f32,
    pub dry: f32,
    pub width: f32,
    /// Values >= 0.5 hold the tail indefinitely.
    pub freeze: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet: 0.33,
            dry: 0.4,
            width: 1.0,
            freeze: 0.0,
        }
    }
}

/// Freeverb configured from [`ReverbParams`].
pub struct Reverb {
    inner: Freeverb,
}

impl Reverb {
    pub fn new(sample_rate: u32, params: ReverbParams) -> Self {
        let mut inner = Freeverb::new(sample_rate as usize);
        inner.set_room_size(params.room_size as f64);
        inner.set_dampening(params.damping as f64);
        inner.set_wet(params.wet as f64);
        inner.set_dry(params.dry as f64);
        inner.set_width(params.width as f64);
        inner.set_freeze(params.freeze >= 0.5);
        Self { inner }
    }

    /// Process a stereo pair in place. Both slices must have equal length.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = self.inner.tick((*l as f64, *r as f64));
            *l = out_l as f32;
            *r = out_r as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ReverbParams {
        ReverbParams {
            room_size: 0.75,
            damping: 0.6,
            wet: 0.35,
            dry: 0.65,
            width: 0.9,
            freeze: 0.0,
        }
    }

    fn energy(s: &[f32]) -> f32 {
        s.iter().map(|x| x * x).sum()
    }

    #[test]
    fn test_impulse_produces_decaying_tail() {
        let mut reverb = Reverb::new(44_100, params());
        let n = 44_100 * 3;
        let mut left = vec![0.0f32; n];
        let mut right = vec![0.0f32; n];
        left[0] = 1.0;
        right[0] = 1.0;
        reverb.process(&mut left, &mut right);

        let early = energy(&left[2_000..22_050]);
        let late = energy(&left[n - 22_050..]);
        assert!(early > 0.0);
        assert!(late < early * 0.1, "early {early} late {late}");
        assert!(left.iter().chain(&right).all(|s| s.is_finite()));
    }

    #[test]
    fn test_dry_only() {
        let p = ReverbParams {
            wet: 0.0,
            dry: 0.5,
            ..params()
        };
        let mut reverb = Reverb::new(44_100, p);
        let mut left = vec![0.3f32, -0.2, 0.1];
        let mut right = vec![0.1f32, 0.2, -0.3];
        reverb.process(&mut left, &mut right);

        // Without wet signal the output is the input times a constant dry gain
        let gain = left[0] / 0.3;
        assert!(gain > 0.0);
        for (got, want) in left.iter().chain(&right).zip([0.3f32, -0.2, 0.1, 0.1, 0.2, -0.3]) {
            assert!((got - want * gain).abs() < 1e-6);
        }
    }

    #[test]
    fn test_wet_adds_energy_after_input() {
        let mut reverb = Reverb::new(44_100, params());
        let mut left = vec![0.0f32; 44_100];
        let mut right = vec![0.0f32; 44_100];
        left[0] = 1.0;
        reverb.process(&mut left, &mut right);

        // The input is summed to mono, so both channels carry the tail
        assert!(energy(&right[1..]) > 0.0);
        assert!(energy(&left[1..]) > 0.0);
    }

    #[test]
    fn test_freeze_mutes_input() {
        let p = ReverbParams {
            freeze: 1.0,
            ..params()
        };
        let mut reverb = Reverb::new(44_100, p);
        let mut left = vec![0.0f32; 4000];
        let mut right = vec![0.0f32; 4000];
        left[0] = 1.0;
        reverb.process(&mut left, &mut right);
        assert!(right.iter().all(|s| *s == 0.0));
    }
}
