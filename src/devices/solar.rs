use crate::devices::types::{Device, daylight_frac, gaussian_noise};
use rand::rngs::StdRng;

/// Rooftop solar array with a half-sine daylight profile.
///
/// Output is `peak_kw · sin((h − sunrise)·π / (sunset − sunrise))` between
/// sunrise and sunset (inclusive), plus additive Gaussian noise, clamped at
/// zero. With the defaults this is `5·sin((h − 6)·π/12)` with σ = 0.5.
#[derive(Debug, Clone)]
pub struct RooftopSolar {
    /// Clear-sky peak output (kW).
    pub peak_kw: f32,

    /// Hour production starts (inclusive).
    pub sunrise_hour: usize,

    /// Hour production ends (inclusive).
    pub sunset_hour: usize,

    /// Standard deviation of additive noise (kW).
    pub noise_std: f32,
}

impl Default for RooftopSolar {
    fn default() -> Self {
        Self::new(5.0, 6, 18, 0.5)
    }
}

impl RooftopSolar {
    /// Creates a solar profile. Negative peak or noise values are clamped to zero.
    pub fn new(peak_kw: f32, sunrise_hour: usize, sunset_hour: usize, noise_std: f32) -> Self {
        Self {
            peak_kw: peak_kw.max(0.0),
            sunrise_hour,
            sunset_hour,
            noise_std: noise_std.max(0.0),
        }
    }

    /// Returns `true` when `hour` falls inside the daylight window.
    pub fn is_daylight(&self, hour: usize) -> bool {
        (self.sunrise_hour..=self.sunset_hour).contains(&(hour % 24))
    }

    /// Noise-free output at `hour`.
    pub fn expected_kw(&self, hour: usize) -> f32 {
        self.peak_kw * daylight_frac(hour, self.sunrise_hour, self.sunset_hour)
    }
}

impl Device for RooftopSolar {
    /// Noise is only drawn during daylight, so night hours consume no randomness.
    fn power_kw(&self, hour: usize, rng: &mut StdRng) -> f32 {
        if !self.is_daylight(hour) {
            return 0.0;
        }
        (self.expected_kw(hour) + gaussian_noise(rng, self.noise_std)).max(0.0)
    }

    fn device_type(&self) -> &'static str {
        "RooftopSolar"
    }
}
