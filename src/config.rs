//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::{LearnedPolicy, Policy, RuleBasedPolicy};
use crate::devices::{Band, HouseholdLoad, RooftopSolar};
use crate::error::SwarmError;
use crate::sim::{Economics, ScenarioModifiers, SwarmSettings, SwarmSimulator};
use crate::topology::{DistanceMetric, Topology};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run size, length and seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Neighbor wiring.
    #[serde(default)]
    pub topology: TopologyConfig,
    /// Per-household hardware.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Solar profile.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Consumption profile.
    #[serde(default)]
    pub load: LoadConfig,
    /// Prices and emission factors.
    #[serde(default)]
    pub economics: EconomicsConfig,
    /// Scenario adjustments.
    #[serde(default)]
    pub scenario: ScenarioModifierConfig,
    /// Decision policy.
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Run size, length and seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of households (must be > 0).
    pub agents: usize,
    /// Number of hourly ticks (must be > 0).
    pub hours: usize,
    /// Master random seed.
    pub seed: u64,
    /// Pause between ticks for live display (ms). Batch runs ignore it.
    pub tick_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: 10,
            hours: 24,
            seed: 42,
            tick_delay_ms: 0,
        }
    }
}

/// Neighbor wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopologyConfig {
    /// `"index_window"`, `"grid"` or `"random"`.
    pub kind: String,
    /// Index distance for `index_window`.
    pub window: usize,
    /// Grid width for `grid`.
    pub cols: usize,
    /// Link distance for `grid` and `random`.
    pub radius: f32,
    /// Placement square side for `random`.
    pub extent: f32,
    /// `"manhattan"` or `"euclidean"` for `random`.
    pub metric: String,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            kind: "index_window".to_string(),
            window: 2,
            cols: 5,
            radius: 1.0,
            extent: 10.0,
            metric: "manhattan".to_string(),
        }
    }
}

/// Per-household hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Battery capacity (kWh, must be > 0).
    pub battery_capacity_kwh: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            battery_capacity_kwh: 10.0,
        }
    }
}

/// Solar profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// Clear-sky peak output (kW).
    pub peak_kw: f32,
    /// First producing hour.
    pub sunrise_hour: usize,
    /// Last producing hour.
    pub sunset_hour: usize,
    /// Standard deviation of additive noise (kW).
    pub noise_std: f32,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            peak_kw: 5.0,
            sunrise_hour: 6,
            sunset_hour: 18,
            noise_std: 0.5,
        }
    }
}

/// Consumption bands (kW).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Morning/evening peak lower bound.
    pub peak_min_kw: f32,
    /// Morning/evening peak upper bound.
    pub peak_max_kw: f32,
    /// Daytime lower bound.
    pub day_min_kw: f32,
    /// Daytime upper bound.
    pub day_max_kw: f32,
    /// Night lower bound.
    pub night_min_kw: f32,
    /// Night upper bound.
    pub night_max_kw: f32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            peak_min_kw: 2.0,
            peak_max_kw: 4.0,
            day_min_kw: 1.0,
            day_max_kw: 2.0,
            night_min_kw: 0.5,
            night_max_kw: 1.0,
        }
    }
}

/// Prices and emission factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsConfig {
    /// Peer trade price per kWh.
    pub peer_price_per_kwh: f32,
    /// Grid import price per kWh.
    pub grid_price_per_kwh: f32,
    /// Grid carbon intensity (kg/kWh).
    pub co2_kg_per_kwh: f32,
    /// Import share of a household without the swarm (0-1).
    pub baseline_grid_share: f32,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        let e = Economics::default();
        Self {
            peer_price_per_kwh: e.peer_price_per_kwh,
            grid_price_per_kwh: e.grid_price_per_kwh,
            co2_kg_per_kwh: e.co2_kg_per_kwh,
            baseline_grid_share: e.baseline_grid_share,
        }
    }
}

/// Scenario adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioModifierConfig {
    /// Multiplier on solar output.
    pub production_factor: f32,
    /// Multiplier on consumption.
    pub consumption_factor: f32,
    /// Multiplier on battery capacity.
    pub battery_factor: f32,
    /// Households whose panels are out of service.
    pub failed_panels: usize,
}

impl Default for ScenarioModifierConfig {
    fn default() -> Self {
        Self {
            production_factor: 1.0,
            consumption_factor: 1.0,
            battery_factor: 1.0,
            failed_panels: 0,
        }
    }
}

/// Decision policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// `"rule_based"` or `"learned"`.
    pub kind: String,
    /// Weights file for `learned`, relative to the working directory.
    pub weights_path: Option<PathBuf>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            kind: "rule_based".to_string(),
            weights_path: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.agents"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Cloud cover assumed by the `cloudy_day` preset.
const CLOUDY_DAY_COVER: f32 = 0.7;

impl ScenarioConfig {
    /// Returns the baseline scenario: ten households over one day.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the cloudy-day preset: 70 % cloud cover cuts production by 63 %.
    pub fn cloudy_day() -> Self {
        Self {
            scenario: ScenarioModifierConfig {
                production_factor: 1.0 - CLOUDY_DAY_COVER * 0.9,
                ..ScenarioModifierConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the panel-failure preset: five households without solar.
    pub fn panel_failure() -> Self {
        Self {
            scenario: ScenarioModifierConfig {
                failed_panels: 5,
                ..ScenarioModifierConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the peak-demand preset: consumption doubled.
    pub fn peak_demand() -> Self {
        Self {
            scenario: ScenarioModifierConfig {
                consumption_factor: 2.0,
                ..ScenarioModifierConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the heatwave preset: air conditioning load and hot panels.
    pub fn heatwave() -> Self {
        Self {
            scenario: ScenarioModifierConfig {
                consumption_factor: 1.5,
                production_factor: 0.85,
                ..ScenarioModifierConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &[
        "baseline",
        "cloudy_day",
        "panel_failure",
        "peak_demand",
        "heatwave",
    ];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "cloudy_day" => Ok(Self::cloudy_day()),
            "panel_failure" => Ok(Self::panel_failure()),
            "peak_demand" => Ok(Self::peak_demand()),
            "heatwave" => Ok(Self::heatwave()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut positive = |field: &str, value: f32| {
            if !(value.is_finite() && value > 0.0) {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        };

        positive("agent.battery_capacity_kwh", self.agent.battery_capacity_kwh);
        positive("scenario.battery_factor", self.scenario.battery_factor);

        let s = &self.simulation;
        if s.agents == 0 {
            errors.push(ConfigError::new("simulation.agents", "must be > 0"));
        }
        if s.hours == 0 {
            errors.push(ConfigError::new("simulation.hours", "must be > 0"));
        }

        let t = &self.topology;
        match t.kind.as_str() {
            "index_window" => {}
            "grid" => {
                if t.cols == 0 {
                    errors.push(ConfigError::new("topology.cols", "must be > 0"));
                }
            }
            "random" => {
                if !(t.extent.is_finite() && t.extent > 0.0) {
                    errors.push(ConfigError::new("topology.extent", "must be > 0"));
                }
            }
            other => errors.push(ConfigError::new(
                "topology.kind",
                format!("must be \"index_window\", \"grid\" or \"random\", got \"{other}\""),
            )),
        }
        if !(t.radius.is_finite() && t.radius >= 0.0) {
            errors.push(ConfigError::new("topology.radius", "must be >= 0"));
        }
        if t.metric != "manhattan" && t.metric != "euclidean" {
            errors.push(ConfigError::new(
                "topology.metric",
                format!("must be \"manhattan\" or \"euclidean\", got \"{}\"", t.metric),
            ));
        }

        let sol = &self.solar;
        if sol.sunrise_hour >= sol.sunset_hour {
            errors.push(ConfigError::new("solar.sunrise_hour", "must be < solar.sunset_hour"));
        }
        if sol.sunset_hour > 23 {
            errors.push(ConfigError::new("solar.sunset_hour", "must be <= 23"));
        }
        if sol.peak_kw < 0.0 {
            errors.push(ConfigError::new("solar.peak_kw", "must be >= 0"));
        }
        if sol.noise_std < 0.0 {
            errors.push(ConfigError::new("solar.noise_std", "must be >= 0"));
        }

        let l = &self.load;
        for (name, min, max) in [
            ("load.peak_min_kw", l.peak_min_kw, l.peak_max_kw),
            ("load.day_min_kw", l.day_min_kw, l.day_max_kw),
            ("load.night_min_kw", l.night_min_kw, l.night_max_kw),
        ] {
            if min < 0.0 {
                errors.push(ConfigError::new(name, "must be >= 0"));
            }
            if min > max {
                errors.push(ConfigError::new(name, "must be <= the band maximum"));
            }
        }

        let e = &self.economics;
        if !(0.0..=1.0).contains(&e.baseline_grid_share) {
            errors.push(ConfigError::new("economics.baseline_grid_share", "must be in [0.0, 1.0]"));
        }
        if e.peer_price_per_kwh < 0.0 || e.grid_price_per_kwh < 0.0 {
            errors.push(ConfigError::new("economics", "prices must be >= 0"));
        }

        let sc = &self.scenario;
        if sc.production_factor < 0.0 {
            errors.push(ConfigError::new("scenario.production_factor", "must be >= 0"));
        }
        if sc.consumption_factor < 0.0 {
            errors.push(ConfigError::new("scenario.consumption_factor", "must be >= 0"));
        }
        if sc.failed_panels > s.agents {
            errors.push(ConfigError::new("scenario.failed_panels", "must be <= simulation.agents"));
        }

        let p = &self.policy;
        match p.kind.as_str() {
            "rule_based" => {}
            "learned" => {
                if p.weights_path.is_none() {
                    errors.push(ConfigError::new(
                        "policy.weights_path",
                        "required when policy.kind is \"learned\"",
                    ));
                }
            }
            other => errors.push(ConfigError::new(
                "policy.kind",
                format!("must be \"rule_based\" or \"learned\", got \"{other}\""),
            )),
        }

        errors
    }

    /// Topology described by the `[topology]` section.
    pub fn topology(&self) -> Topology {
        let t = &self.topology;
        match t.kind.as_str() {
            "grid" => Topology::Grid {
                cols: t.cols,
                radius: t.radius,
            },
            "random" => Topology::Random {
                extent: t.extent,
                radius: t.radius,
                metric: if t.metric == "euclidean" {
                    DistanceMetric::Euclidean
                } else {
                    DistanceMetric::Manhattan
                },
            },
            _ => Topology::IndexWindow { window: t.window },
        }
    }

    /// Simulator settings described by this scenario.
    pub fn settings(&self) -> SwarmSettings {
        let l = &self.load;
        SwarmSettings {
            num_agents: self.simulation.agents,
            seed: self.simulation.seed,
            battery_capacity_kwh: self.agent.battery_capacity_kwh,
            topology: self.topology(),
            solar: RooftopSolar::new(
                self.solar.peak_kw,
                self.solar.sunrise_hour,
                self.solar.sunset_hour,
                self.solar.noise_std,
            ),
            load: HouseholdLoad {
                peak: Band::new(l.peak_min_kw, l.peak_max_kw),
                day: Band::new(l.day_min_kw, l.day_max_kw),
                night: Band::new(l.night_min_kw, l.night_max_kw),
            },
            modifiers: ScenarioModifiers {
                production_factor: self.scenario.production_factor,
                consumption_factor: self.scenario.consumption_factor,
                battery_factor: self.scenario.battery_factor,
                failed_panels: self.scenario.failed_panels,
            },
            economics: Economics {
                peer_price_per_kwh: self.economics.peer_price_per_kwh,
                grid_price_per_kwh: self.economics.grid_price_per_kwh,
                co2_kg_per_kwh: self.economics.co2_kg_per_kwh,
                baseline_grid_share: self.economics.baseline_grid_share,
            },
        }
    }

    /// Loads the configured policy.
    ///
    /// # Errors
    ///
    /// Fails when learned weights cannot be read or parsed.
    pub fn policy(&self) -> Result<Policy, SwarmError> {
        match (self.policy.kind.as_str(), &self.policy.weights_path) {
            ("learned", Some(path)) => Ok(Policy::Learned(LearnedPolicy::load(path)?)),
            _ => Ok(Policy::RuleBased(RuleBasedPolicy)),
        }
    }

    /// Validates the scenario and builds a simulator from it.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidConfig`] listing every validation error,
    /// or the first construction error.
    pub fn build(&self) -> Result<SwarmSimulator, SwarmError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SwarmError::InvalidConfig(errors));
        }
        SwarmSimulator::new(self.settings(), self.policy()?)
    }
}
