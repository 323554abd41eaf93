//! Multi-agent solar energy-sharing swarm simulator.
//!
//! Households with rooftop solar and a battery decide every simulated hour
//! whether to store, share with a neighbor, sell, or request energy. The
//! [`sim::SwarmSimulator`] drives the tick loop and records per-hour totals.

pub mod agent;
pub mod anomaly;
/// Message routing, peer negotiation and voting.
pub mod comm;
pub mod config;
/// Exogenous household signals.
pub mod devices;
pub mod error;
pub mod forecast;
pub mod io;
pub mod runner;
/// Swarm orchestrator, clock, result types and KPIs.
pub mod sim;
pub mod topology;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "tui")]
pub mod tui;

pub use error::SwarmError;
