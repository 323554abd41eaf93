use crate::devices::types::Device;
use rand::{Rng, rngs::StdRng};

/// A `[min, max)` consumption band in kilowatts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Lower bound (kW).
    pub min_kw: f32,
    /// Upper bound (kW).
    pub max_kw: f32,
}

impl Band {
    /// Creates a band; bounds are swapped if given in reverse.
    pub fn new(min_kw: f32, max_kw: f32) -> Self {
        Self {
            min_kw: min_kw.min(max_kw),
            max_kw: max_kw.max(min_kw),
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f32 {
        if self.max_kw > self.min_kw {
            rng.random_range(self.min_kw..self.max_kw)
        } else {
            self.min_kw
        }
    }
}

/// Household consumption as a time-of-day step function.
///
/// Morning (06-09) and evening (18-22) draw from the peak band, the rest of
/// the day from the daytime band, and night from the night band. Each
/// reading is uniform within its band.
#[derive(Debug, Clone)]
pub struct HouseholdLoad {
    /// Morning and evening peaks.
    pub peak: Band,
    /// Between the peaks.
    pub day: Band,
    /// Late evening through early morning.
    pub night: Band,
}

impl Default for HouseholdLoad {
    fn default() -> Self {
        Self {
            peak: Band::new(2.0, 4.0),
            day: Band::new(1.0, 2.0),
            night: Band::new(0.5, 1.0),
        }
    }
}

impl HouseholdLoad {
    /// Band in effect at `hour`.
    pub fn band(&self, hour: usize) -> Band {
        match hour % 24 {
            6..=9 | 18..=22 => self.peak,
            10..=17 => self.day,
            _ => self.night,
        }
    }
}

impl Device for HouseholdLoad {
    fn power_kw(&self, hour: usize, rng: &mut StdRng) -> f32 {
        self.band(hour).sample(rng).max(0.0)
    }

    fn device_type(&self) -> &'static str {
        "HouseholdLoad"
    }
}
