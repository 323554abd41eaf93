//! Exogenous household signals: rooftop solar and household consumption.

/// Time-of-day household consumption.
pub mod load;
/// Rooftop solar generation.
pub mod solar;
pub mod types;

pub use load::{Band, HouseholdLoad};
pub use solar::RooftopSolar;
pub use types::Device;
