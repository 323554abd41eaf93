//! Core simulation types: settings, per-hour series and per-tick reports.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::agent::{AgentId, Decision};
use crate::devices::{HouseholdLoad, RooftopSolar};
use crate::topology::Topology;

/// Scenario adjustments applied on top of the household profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioModifiers {
    /// Multiplier on every solar reading.
    pub production_factor: f32,
    /// Multiplier on every consumption reading.
    pub consumption_factor: f32,
    /// Multiplier on battery capacity at agent creation.
    pub battery_factor: f32,
    /// Number of agents whose panels produce nothing for the whole run.
    pub failed_panels: usize,
}

impl Default for ScenarioModifiers {
    fn default() -> Self {
        Self {
            production_factor: 1.0,
            consumption_factor: 1.0,
            battery_factor: 1.0,
            failed_panels: 0,
        }
    }
}

/// Prices and emission factors used by reports and KPIs.
#[derive(Debug, Clone, PartialEq)]
pub struct Economics {
    /// Peer-to-peer trade price per kWh.
    pub peer_price_per_kwh: f32,
    /// Grid import price per kWh.
    pub grid_price_per_kwh: f32,
    /// Grid carbon intensity (kg CO₂ per kWh).
    pub co2_kg_per_kwh: f32,
    /// Share of consumption a household without the swarm would import.
    pub baseline_grid_share: f32,
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            peer_price_per_kwh: 0.12,
            grid_price_per_kwh: 0.15,
            co2_kg_per_kwh: 0.5,
            baseline_grid_share: 0.4,
        }
    }
}

/// Everything needed to build a [`super::SwarmSimulator`].
///
/// # Examples
///
/// ```
/// use solar_swarm::sim::SwarmSettings;
///
/// let settings = SwarmSettings::new(25);
/// assert_eq!(settings.num_agents, 25);
/// assert_eq!(settings.battery_capacity_kwh, 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct SwarmSettings {
    /// Number of households (must be > 0).
    pub num_agents: usize,
    /// Seed for the run's single random source.
    pub seed: u64,
    /// Battery capacity per household before the scenario factor (kWh).
    pub battery_capacity_kwh: f32,
    /// Neighbor wiring.
    pub topology: Topology,
    /// Solar profile shared by every household.
    pub solar: RooftopSolar,
    /// Consumption profile shared by every household.
    pub load: HouseholdLoad,
    /// Scenario adjustments.
    pub modifiers: ScenarioModifiers,
    /// Prices and emission factors.
    pub economics: Economics,
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self {
            num_agents: 10,
            seed: 42,
            battery_capacity_kwh: 10.0,
            topology: Topology::default(),
            solar: RooftopSolar::default(),
            load: HouseholdLoad::default(),
            modifiers: ScenarioModifiers::default(),
            economics: Economics::default(),
        }
    }
}

impl SwarmSettings {
    /// Default settings with `num_agents` households.
    pub fn new(num_agents: usize) -> Self {
        Self {
            num_agents,
            ..Self::default()
        }
    }

    /// Replaces the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Community totals for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickTotals {
    /// Σ `min(production, consumption)`.
    pub solar_used: f32,
    /// Σ `max(0, consumption − production)`.
    pub grid_import: f32,
    /// Σ `share_energy` amounts.
    pub shared_energy: f32,
    /// Σ production.
    pub production: f32,
    /// Σ consumption.
    pub consumption: f32,
    /// Mean battery fraction across agents.
    pub avg_battery_fraction: f32,
}

/// Per-hour aggregate series for a run, one entry per tick in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationResult {
    /// Solar energy consumed on site (kWh).
    pub solar_used: Vec<f32>,
    /// Energy imported from the grid (kWh).
    pub grid_import: Vec<f32>,
    /// Energy shared between neighbors (kWh).
    pub shared_energy: Vec<f32>,
    /// Total production (kWh).
    pub production: Vec<f32>,
    /// Total consumption (kWh).
    pub consumption: Vec<f32>,
    /// Mean battery fraction at the end of the tick.
    pub avg_battery_fraction: Vec<f32>,
}

impl SimulationResult {
    /// Appends one tick's totals to every series.
    pub fn push(&mut self, totals: &TickTotals) {
        self.solar_used.push(totals.solar_used);
        self.grid_import.push(totals.grid_import);
        self.shared_energy.push(totals.shared_energy);
        self.production.push(totals.production);
        self.consumption.push(totals.consumption);
        self.avg_battery_fraction.push(totals.avg_battery_fraction);
    }

    /// Number of ticks recorded.
    pub fn len(&self) -> usize {
        self.solar_used.len()
    }

    /// Returns `true` before the first tick.
    pub fn is_empty(&self) -> bool {
        self.solar_used.is_empty()
    }

    /// Headline numbers for the run.
    pub fn summary(&self) -> RunSummary {
        let solar: f32 = self.solar_used.iter().sum();
        let grid: f32 = self.grid_import.iter().sum();
        let solar_usage_pct = if solar + grid > 0.0 {
            solar / (solar + grid) * 100.0
        } else {
            0.0
        };
        RunSummary {
            hours: self.len(),
            solar_usage_pct,
            grid_import_pct: if solar + grid > 0.0 { 100.0 - solar_usage_pct } else { 0.0 },
            total_shared_kwh: self.shared_energy.iter().sum(),
            transfer_hours: self.shared_energy.iter().filter(|&&s| s > 0.0).count(),
        }
    }
}

/// Headline numbers printed after a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Ticks simulated.
    pub hours: usize,
    /// `solar_used / (solar_used + grid_import) × 100`, 0 with no demand.
    pub solar_usage_pct: f32,
    /// Complement of `solar_usage_pct`, 0 with no demand.
    pub grid_import_pct: f32,
    /// Total energy shared (kWh).
    pub total_shared_kwh: f32,
    /// Ticks in which any energy was shared.
    pub transfer_hours: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Results ({} hours) ---", self.hours)?;
        writeln!(f, "Solar usage:           {:.1}%", self.solar_usage_pct)?;
        writeln!(f, "Grid import:           {:.1}%", self.grid_import_pct)?;
        writeln!(f, "Energy shared:         {:.1} kWh", self.total_shared_kwh)?;
        write!(f, "Hours with transfers:  {}", self.transfer_hours)
    }
}

/// One peer-to-peer transfer reported in a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyFlow {
    /// Sharing agent.
    pub from: AgentId,
    /// Receiving agent.
    pub to: AgentId,
    /// Energy (kWh).
    pub amount: f32,
}

/// Enriched result of one tick, published to live feeds.
///
/// Field names are part of the feed format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// Simulated hour.
    pub hour: usize,
    /// Transfers decided this tick.
    pub energy_flows: Vec<EnergyFlow>,
    /// Same as `energy_flows`, kept for feed consumers using the older name.
    pub energy_transfers: Vec<EnergyFlow>,
    /// `total_solar_used / total_production × 100`, 0 without production.
    pub solar_usage_pct: f32,
    /// Mean battery level across agents (%).
    pub avg_battery: f32,
    /// `total_shared × peer price`.
    pub cost_savings: f32,
    /// `total_shared × grid carbon intensity` (kg).
    pub co2_saved: f32,
    /// Every agent's decision, in id order.
    pub agent_decisions: Vec<Decision>,
    /// Decision counts by action name.
    pub decision_stats: BTreeMap<String, usize>,
    /// Non-zero shares as a percentage of all decisions.
    pub decision_efficiency: f32,
    /// Σ production (kW).
    pub total_production: f32,
    /// Σ consumption (kW).
    pub total_consumption: f32,
    /// Σ `min(production, consumption)`.
    pub total_solar_used: f32,
    /// Σ `max(0, consumption − production)`.
    pub total_grid_import: f32,
    /// Σ transfer amounts.
    pub total_shared: f32,
    /// Agents with any production or consumption.
    pub active_agents: usize,
    /// Σ neighbor-list lengths.
    pub network_connections: usize,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>3} | prod={:>6.2} kW  cons={:>6.2} kW | solar={:>6.2}  grid={:>6.2}  \
             shared={:>5.2} ({} flows) | battery={:>5.1}% | solar use={:>5.1}%",
            self.hour,
            self.total_production,
            self.total_consumption,
            self.total_solar_used,
            self.total_grid_import,
            self.total_shared,
            self.energy_flows.len(),
            self.avg_battery,
            self.solar_usage_pct,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(solar_used: f32, grid_import: f32, shared_energy: f32) -> TickTotals {
        TickTotals {
            solar_used,
            grid_import,
            shared_energy,
            ..TickTotals::default()
        }
    }

    #[test]
    fn summary_percentages() {
        let mut r = SimulationResult::default();
        r.push(&totals(3.0, 1.0, 0.0));
        r.push(&totals(3.0, 3.0, 2.5));
        let s = r.summary();
        assert_eq!(s.hours, 2);
        assert!((s.solar_usage_pct - 60.0).abs() < 1e-4);
        assert!((s.grid_import_pct - 40.0).abs() < 1e-4);
        assert_eq!(s.total_shared_kwh, 2.5);
        assert_eq!(s.transfer_hours, 1);
    }

    #[test]
    fn summary_without_demand_is_zero() {
        let mut r = SimulationResult::default();
        r.push(&TickTotals::default());
        let s = r.summary();
        assert_eq!(s.solar_usage_pct, 0.0);
        assert_eq!(s.grid_import_pct, 0.0);
        assert!(!s.solar_usage_pct.is_nan());
    }

    #[test]
    fn push_keeps_series_aligned() {
        let mut r = SimulationResult::default();
        assert!(r.is_empty());
        for _ in 0..3 {
            r.push(&totals(1.0, 1.0, 1.0));
        }
        assert_eq!(r.len(), 3);
        assert_eq!(r.grid_import.len(), 3);
        assert_eq!(r.shared_energy.len(), 3);
        assert_eq!(r.avg_battery_fraction.len(), 3);
    }

    #[test]
    fn summary_display_does_not_panic() {
        let s = SimulationResult::default().summary();
        assert!(format!("{s}").contains("Simulation Results"));
    }
}
