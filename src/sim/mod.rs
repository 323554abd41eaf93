//! Swarm simulation: orchestrator, clock, result types and KPIs.

/// Simulation clock and run cancellation.
pub mod clock;
pub mod kpi;
/// Hour-by-hour swarm orchestrator.
pub mod simulator;
pub mod types;

pub use clock::RunControl;
pub use kpi::KpiReport;
pub use simulator::SwarmSimulator;
pub use types::{
    Economics, EnergyFlow, RunSummary, ScenarioModifiers, SimulationResult, StepReport,
    SwarmSettings, TickTotals,
};
