// Seeded Rate Jitter — perturbs scenario target rates reproducibly
// Keeps rates on the UI slider grid so jittered runs stay reachable inputs

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Step of the target-rate slider, msg/s.
pub const RATE_STEP: u64 = 1_000;

pub struct RateJitter {
    rng: ChaCha8Rng,
    /// Relative amplitude, e.g. 0.1 = ±10%.
    amplitude: f64,
    pub perturbed_ticks: u64,
}

impl RateJitter {
    /// Non-finite amplitudes disable jitter.
    pub fn new(seed: u64, amplitude: f64) -> Self {
        let amplitude = if amplitude.is_finite() {
            amplitude.clamp(0.0, 1.0)
        } else {
            tracing::warn!(amplitude, "non-finite jitter amplitude, disabling jitter");
            0.0
        };
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            amplitude,
            perturbed_ticks: 0,
        }
    }

    /// Jitter `rate` by up to ±amplitude and snap to the slider step.
    /// With zero amplitude the rate passes through untouched.
    pub fn apply(&mut self, rate: u64) -> u64 {
        if self.amplitude <= 0.0 || rate == 0 {
            return rate;
        }
        let factor = 1.0 + self.rng.gen_range(-self.amplitude..=self.amplitude);
        let jittered = snap_to_step(rate as f64 * factor);
        if jittered != rate {
            self.perturbed_ticks += 1;
        }
        jittered
    }
}

fn snap_to_step(rate: f64) -> u64 {
    let steps = (rate.max(0.0) / RATE_STEP as f64).round();
    steps as u64 * RATE_STEP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amplitude_is_identity() {
        let mut jitter = RateJitter::new(7, 0.0);
        for rate in [0, 20, 30_000, 99_000] {
            assert_eq!(jitter.apply(rate), rate);
        }
        assert_eq!(jitter.perturbed_ticks, 0);
    }

    #[test]
    fn non_finite_amplitude_disables_jitter() {
        for amplitude in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut jitter = RateJitter::new(0, amplitude);
            assert_eq!(jitter.apply(50_000), 50_000);
            assert_eq!(jitter.perturbed_ticks, 0);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RateJitter::new(42, 0.2);
        let mut b = RateJitter::new(42, 0.2);
        for _ in 0..100 {
            assert_eq!(a.apply(50_000), b.apply(50_000));
        }
    }

    #[test]
    fn jitter_stays_within_amplitude_and_on_grid() {
        let mut jitter = RateJitter::new(1, 0.1);
        for _ in 0..1_000 {
            let rate = jitter.apply(50_000);
            assert!((45_000..=55_000).contains(&rate), "rate {rate}");
            assert_eq!(rate % RATE_STEP, 0);
        }
    }
}
