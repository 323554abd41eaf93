//! Error types raised while constructing a swarm simulation.
//!
//! Only construction can fail. Once a [`crate::sim::SwarmSimulator`] exists,
//! ticks, decisions and negotiation never return errors: failed offers and
//! ballots are reported through `bool`/`Option` results instead.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Errors that can occur while building agents, topology, or policy.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    /// A simulation needs at least one agent.
    #[error("invalid agent count {0}: a swarm needs at least one agent")]
    InvalidAgentCount(usize),

    /// A run needs at least one hourly tick.
    #[error("invalid hour count {0}: a run needs at least one hour")]
    InvalidHours(usize),

    /// Topology parameters cannot produce a neighborhood.
    #[error("invalid topology: {reason}")]
    InvalidTopology {
        /// Description of the malformed parameter.
        reason: String,
    },

    /// Learned policy weights could not be read from disk.
    #[error("cannot read policy weights \"{}\": {source}", path.display())]
    PolicyLoad {
        /// Path of the weights file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Learned policy weights are not valid TOML.
    #[error("invalid policy weights \"{}\": {source}", path.display())]
    PolicyParse {
        /// Path of the weights file.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// Scenario validation failed on one or more fields.
    #[error("invalid scenario: {}", join_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
