//! Synthetic reading generator used while no device is connected

use contracts::{round_tenth, Reading, SyntheticConfig};
use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

const AIR_QUALITY_MIN: f64 = 100.0;
const AIR_QUALITY_MAX: f64 = 1000.0;

/// Bounded uniform perturbation around fixed baselines
#[derive(Debug)]
pub struct SyntheticGenerator {
    config: SyntheticConfig,
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic generator
    pub fn with_seed(config: SyntheticConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn around(&mut self, base: f64, amplitude: f64) -> f64 {
        base + self.uniform(-amplitude, amplitude)
    }

    /// Uniform sample in `[low, high]`; 0 when the range is unusable
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        match Uniform::new_inclusive(low, high) {
            Ok(dist) => self.rng.sample(dist),
            Err(e) => {
                warn!(low, high, error = %e, "Unusable synthetic range, skipping perturbation");
                0.0
            }
        }
    }

    pub fn next_reading(&mut self) -> Reading {
        let c = self.config.clone();

        let temperature = round_tenth(self.around(c.base_temperature, c.temperature_amplitude));
        let humidity =
            round_tenth(self.around(c.base_humidity, c.humidity_amplitude).clamp(0.0, 100.0));
        let heat_index = round_tenth(temperature + self.uniform(0.0, c.heat_index_spread));

        let air_quality = c.include_air_quality.then(|| {
            round_tenth(
                self.around(c.base_air_quality, c.air_quality_amplitude)
                    .clamp(AIR_QUALITY_MIN, AIR_QUALITY_MAX),
            )
        });

        Reading::new(temperature, humidity)
            .with_heat_index(Some(heat_index))
            .with_air_quality(air_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_tenth(v: f64) -> bool {
        ((v * 10.0).round() - v * 10.0).abs() < 1e-6
    }

    #[test]
    fn test_values_within_bounds() {
        let mut generator = SyntheticGenerator::with_seed(SyntheticConfig::default(), 7);

        for _ in 0..500 {
            let r = generator.next_reading();
            assert!((20.0..=30.0).contains(&r.temperature), "{r:?}");
            assert!((40.0..=70.0).contains(&r.humidity), "{r:?}");
            let hi = r.heat_index.unwrap();
            assert!(hi >= r.temperature && hi <= r.temperature + 2.0 + 1e-9, "{r:?}");
            assert!(r.air_quality.is_none());
            assert!(is_tenth(r.temperature) && is_tenth(r.humidity) && is_tenth(hi));
        }
    }

    #[test]
    fn test_air_quality_clamped() {
        let config = SyntheticConfig {
            include_air_quality: true,
            base_air_quality: 950.0,
            air_quality_amplitude: 500.0,
            ..Default::default()
        };
        let mut generator = SyntheticGenerator::with_seed(config, 1);

        for _ in 0..200 {
            let ppm = generator.next_reading().air_quality.unwrap();
            assert!((AIR_QUALITY_MIN..=AIR_QUALITY_MAX).contains(&ppm));
        }
    }

    #[test]
    fn test_seeded_generators_agree() {
        let mut a = SyntheticGenerator::with_seed(SyntheticConfig::default(), 42);
        let mut b = SyntheticGenerator::with_seed(SyntheticConfig::default(), 42);
        for _ in 0..10 {
            let (ra, rb) = (a.next_reading(), b.next_reading());
            assert_eq!((ra.temperature, ra.humidity), (rb.temperature, rb.humidity));
        }
    }

    #[test]
    fn test_zero_amplitude_is_constant() {
        let config = SyntheticConfig {
            temperature_amplitude: 0.0,
            humidity_amplitude: 0.0,
            heat_index_spread: 0.0,
            ..Default::default()
        };
        let r = SyntheticGenerator::with_seed(config, 3).next_reading();
        assert_eq!(r.temperature, 25.0);
        assert_eq!(r.humidity, 55.0);
        assert_eq!(r.heat_index, Some(25.0));
    }

    #[test]
    fn test_unusable_amplitude_does_not_panic() {
        let config = SyntheticConfig {
            temperature_amplitude: f64::INFINITY,
            humidity_amplitude: 1e308,
            heat_index_spread: f64::NAN,
            ..Default::default()
        };
        let mut generator = SyntheticGenerator::with_seed(config, 5);

        let r = generator.next_reading();
        assert_eq!(r.temperature, 25.0);
        assert_eq!(r.humidity, 55.0);
        assert_eq!(r.heat_index, Some(25.0));
    }
}
