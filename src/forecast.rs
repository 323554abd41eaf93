//! Solar production forecasting for decision support.
//!
//! Forecasts cover the next 24 hours from a start time and carry a ±15 %
//! confidence band. Values are rounded to two decimals.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::devices::RooftopSolar;

/// Number of hourly points in a forecast.
pub const FORECAST_HOURS: usize = 24;

const BAND_LOWER: f32 = 0.85;
const BAND_UPPER: f32 = 1.15;
const CLOUD_DERATE: f32 = 0.7;

/// One observed hour, used as forecast input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Hour of day (0-23).
    pub hour: usize,
    /// Production (kWh).
    pub production: f32,
    /// Consumption (kWh).
    pub consumption: f32,
    /// Battery level as a fraction of capacity.
    pub battery_fraction: f32,
}

/// Optional weather input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherHint {
    /// Cloud cover fraction (0.0 clear to 1.0 overcast).
    pub cloud_cover: f32,
}

impl WeatherHint {
    /// Builds a hint from a cloud cover percentage (0-100).
    pub fn from_percent(cloud_cover_pct: f32) -> Self {
        Self {
            cloud_cover: (cloud_cover_pct / 100.0).clamp(0.0, 1.0),
        }
    }

    /// Production multiplier, `1 − 0.7 · cover`.
    pub fn derate(&self) -> f32 {
        1.0 - self.cloud_cover.clamp(0.0, 1.0) * CLOUD_DERATE
    }
}

/// One forecast hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Start of the forecast hour.
    pub timestamp: DateTime<Utc>,
    /// Expected production (kWh).
    pub predicted_kwh: f32,
    /// Lower bound (kWh).
    pub confidence_lower: f32,
    /// Upper bound (kWh).
    pub confidence_upper: f32,
}

impl ForecastPoint {
    fn new(timestamp: DateTime<Utc>, production: f32) -> Self {
        Self {
            timestamp,
            predicted_kwh: round2(production.max(0.0)),
            confidence_lower: round2((production * BAND_LOWER).max(0.0)),
            confidence_upper: round2(production * BAND_UPPER),
        }
    }
}

fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}

/// Predicts the next 24 hours of production.
pub trait Forecaster {
    /// Returns [`FORECAST_HOURS`] points starting at `start`.
    fn predict_24h(
        &self,
        start: DateTime<Utc>,
        history: &[HistoryRecord],
        weather: Option<&WeatherHint>,
    ) -> Vec<ForecastPoint>;
}

fn hourly(
    start: DateTime<Utc>,
    weather: Option<&WeatherHint>,
    mut production_at: impl FnMut(usize) -> f32,
) -> Vec<ForecastPoint> {
    let derate = weather.map_or(1.0, WeatherHint::derate);
    (0..FORECAST_HOURS)
        .map(|i| {
            let ts = start + Duration::hours(i as i64);
            ForecastPoint::new(ts, production_at(ts.hour() as usize) * derate)
        })
        .collect()
}

/// Clear-sky daylight sinusoid, derated for cloud cover. Ignores history.
#[derive(Debug, Clone, Default)]
pub struct SinusoidalForecaster {
    /// Solar profile used for the expected curve.
    pub solar: RooftopSolar,
}

impl Forecaster for SinusoidalForecaster {
    fn predict_24h(
        &self,
        start: DateTime<Utc>,
        _history: &[HistoryRecord],
        weather: Option<&WeatherHint>,
    ) -> Vec<ForecastPoint> {
        hourly(start, weather, |hour| self.solar.expected_kw(hour))
    }
}

/// "Tomorrow is today" forecaster.
///
/// With at least a day of history, each hour is forecast as the mean
/// production observed at that hour of day. Hours without observations, or
/// any forecast made with less than a day of history, use the sinusoid.
#[derive(Debug, Clone, Default)]
pub struct NaiveForecast {
    /// Curve used when history is missing.
    pub fallback: SinusoidalForecaster,
}

impl NaiveForecast {
    /// Mean production per hour of day, `None` where nothing was observed.
    pub fn hourly_profile(history: &[HistoryRecord]) -> [Option<f32>; 24] {
        let mut sums = [0.0_f32; 24];
        let mut counts = [0_usize; 24];
        for r in history {
            let h = r.hour % 24;
            sums[h] += r.production;
            counts[h] += 1;
        }
        std::array::from_fn(|h| (counts[h] > 0).then(|| sums[h] / counts[h] as f32))
    }
}

impl Forecaster for NaiveForecast {
    fn predict_24h(
        &self,
        start: DateTime<Utc>,
        history: &[HistoryRecord],
        weather: Option<&WeatherHint>,
    ) -> Vec<ForecastPoint> {
        if history.len() < FORECAST_HOURS {
            return self.fallback.predict_24h(start, history, weather);
        }
        let profile = Self::hourly_profile(history);
        hourly(start, weather, |hour| {
            profile[hour].unwrap_or_else(|| self.fallback.solar.expected_kw(hour))
        })
    }
}
