//! Post-hoc KPI computation from simulation results.

use std::fmt;

use serde::Serialize;

use super::types::{Economics, SimulationResult};

/// Kilograms of CO₂ one tree absorbs per year.
const TREE_KG_CO2_PER_YEAR: f32 = 21.0;

fn pct(numerator: f32, denominator: f32) -> f32 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

/// Energy, economic and environmental indicators for a complete run.
///
/// Computed post-hoc from a [`SimulationResult`]. Savings and emissions are
/// measured against a household that imports a fixed share of its
/// consumption (`baseline_grid_share`); the run is treated as one day when
/// scaling to monthly and annual figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    /// Total production (kWh).
    pub total_production_kwh: f32,
    /// Total consumption (kWh).
    pub total_consumption_kwh: f32,
    /// Solar consumed on site as a share of production (%).
    pub solar_utilization_pct: f32,
    /// Consumption not imported from the grid (%).
    pub self_sufficiency_pct: f32,
    /// Consumption imported from the grid (%).
    pub grid_dependency_pct: f32,
    /// Shared energy as a share of production (%).
    pub sharing_efficiency_pct: f32,
    /// Grid import cost with the swarm.
    pub cost_with_swarm: f32,
    /// Grid import cost at the baseline import share.
    pub cost_baseline: f32,
    /// `cost_baseline − cost_with_swarm`.
    pub daily_savings: f32,
    /// Daily savings × 30.
    pub monthly_savings: f32,
    /// Daily savings × 365.
    pub annual_savings: f32,
    /// Savings as a share of the baseline cost (%).
    pub savings_pct: f32,
    /// Emissions avoided versus the baseline (kg).
    pub daily_co2_avoided_kg: f32,
    /// Daily CO₂ × 30 (kg).
    pub monthly_co2_avoided_kg: f32,
    /// Daily CO₂ × 365 (t).
    pub annual_co2_avoided_tons: f32,
    /// Trees needed to absorb the annual CO₂ avoided.
    pub trees_equivalent: f32,
}

impl KpiReport {
    /// Computes all KPIs from the recorded series.
    ///
    /// Every ratio with a zero denominator is reported as 0.
    pub fn from_results(results: &SimulationResult, economics: &Economics) -> Self {
        let production: f32 = results.production.iter().sum();
        let consumption: f32 = results.consumption.iter().sum();
        let solar_used: f32 = results.solar_used.iter().sum();
        let grid_import: f32 = results.grid_import.iter().sum();
        let shared: f32 = results.shared_energy.iter().sum();

        let baseline_import = consumption * economics.baseline_grid_share;
        let cost_with_swarm = grid_import * economics.grid_price_per_kwh;
        let cost_baseline = baseline_import * economics.grid_price_per_kwh;
        let savings = cost_baseline - cost_with_swarm;
        let co2_kg = (baseline_import - grid_import) * economics.co2_kg_per_kwh;

        Self {
            total_production_kwh: production,
            total_consumption_kwh: consumption,
            solar_utilization_pct: pct(solar_used, production),
            self_sufficiency_pct: pct(consumption - grid_import, consumption),
            grid_dependency_pct: pct(grid_import, consumption),
            sharing_efficiency_pct: pct(shared, production),
            cost_with_swarm,
            cost_baseline,
            daily_savings: savings,
            monthly_savings: savings * 30.0,
            annual_savings: savings * 365.0,
            savings_pct: pct(savings, cost_baseline),
            daily_co2_avoided_kg: co2_kg,
            monthly_co2_avoided_kg: co2_kg * 30.0,
            annual_co2_avoided_tons: co2_kg / 1000.0 * 365.0,
            trees_equivalent: co2_kg * 365.0 / TREE_KG_CO2_PER_YEAR,
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Solar utilization:     {:.1}%", self.solar_utilization_pct)?;
        writeln!(f, "Self-sufficiency:      {:.1}%", self.self_sufficiency_pct)?;
        writeln!(f, "Grid dependency:       {:.1}%", self.grid_dependency_pct)?;
        writeln!(f, "Energy sharing:        {:.1}%", self.sharing_efficiency_pct)?;
        writeln!(f, "Daily savings:         ${:.2}", self.daily_savings)?;
        writeln!(f, "Monthly savings:       ${:.2}", self.monthly_savings)?;
        writeln!(f, "Annual savings:        ${:.2}", self.annual_savings)?;
        writeln!(f, "Savings percentage:    {:.1}%", self.savings_pct)?;
        writeln!(f, "Daily CO2 avoided:     {:.1} kg", self.daily_co2_avoided_kg)?;
        writeln!(f, "Monthly CO2 avoided:   {:.1} kg", self.monthly_co2_avoided_kg)?;
        writeln!(f, "Annual CO2 avoided:    {:.2} t", self.annual_co2_avoided_tons)?;
        write!(f, "Trees equivalent:      {:.0}", self.trees_equivalent)
    }
}
