//! Shared test fixtures for integration tests.

use std::path::PathBuf;

use solar_swarm::agent::{LearnedPolicy, Policy};
use solar_swarm::config::ScenarioConfig;
use solar_swarm::sim::{SwarmSettings, SwarmSimulator};

/// Default settings for `n` households (seed 42).
pub fn default_settings(n: usize) -> SwarmSettings {
    SwarmSettings::new(n)
}

/// Rule-based simulator with default settings.
pub fn default_simulator(n: usize) -> SwarmSimulator {
    SwarmSimulator::new(default_settings(n), Policy::default()).expect("default settings are valid")
}

/// Path of the learned weights shipped with the scenarios.
pub fn learned_weights_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/learned_weights.toml")
}

/// Learned policy loaded from the shipped weights.
pub fn learned_policy() -> Policy {
    Policy::Learned(LearnedPolicy::load(&learned_weights_path()).expect("weights should load"))
}

/// Baseline scenario shrunk to `agents` households and `hours` ticks.
pub fn small_scenario(agents: usize, hours: usize) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.simulation.agents = agents;
    cfg.simulation.hours = hours;
    cfg
}
