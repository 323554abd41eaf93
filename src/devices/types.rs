//! Common types and helpers for household signal generators.

use rand::{Rng, rngs::StdRng};

/// A source of instantaneous household power readings.
///
/// Generators hold no random state of their own; the simulator threads one
/// seeded RNG through every call so a run is reproducible end to end.
pub trait Device {
    /// Returns the power (kW, non-negative) at the given hour of the day.
    ///
    /// # Arguments
    ///
    /// * `hour` - Simulation hour; wrapped modulo 24
    /// * `rng` - Random source for noise
    fn power_kw(&self, hour: usize, rng: &mut StdRng) -> f32;

    /// Returns a human-readable type name for the device.
    fn device_type(&self) -> &'static str;
}

/// Half-sine daylight fraction in `[0, 1]`.
///
/// Zero outside `[sunrise, sunset]`, peaking midway between them.
pub fn daylight_frac(hour: usize, sunrise: usize, sunset: usize) -> f32 {
    let h = hour % 24;
    if sunset <= sunrise || h < sunrise || h > sunset {
        return 0.0;
    }
    let span = (sunset - sunrise) as f32;
    ((h - sunrise) as f32 * std::f32::consts::PI / span).sin().max(0.0)
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f32) -> f32 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f32 = rng.random::<f32>().clamp(1e-6, 1.0);
    let u2: f32 = rng.random::<f32>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z0 * std_dev
}
