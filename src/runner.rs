//! One-call scenario execution used by the binary and integration tests.

use tracing::{info, warn};

use crate::anomaly::{AgentSnapshot, Alert, AnomalyDetector, RuleBasedDetector};
use crate::config::ScenarioConfig;
use crate::error::SwarmError;
use crate::forecast::HistoryRecord;
use crate::sim::{KpiReport, SimulationResult, StepReport};

/// Everything a batch run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Enriched per-tick reports, in tick order.
    pub steps: Vec<StepReport>,
    /// Per-hour series.
    pub result: SimulationResult,
    /// Aggregate indicators.
    pub kpi: KpiReport,
    /// Advisory alerts raised after each tick.
    pub alerts: Vec<Alert>,
    /// Agent states after the last tick.
    pub snapshots: Vec<AgentSnapshot>,
    /// Per-household averages per tick, usable as forecast history.
    pub history: Vec<HistoryRecord>,
}

/// Builds a simulator from `config` and runs it for `simulation.hours` ticks.
///
/// Anomaly checks run after every tick; alerts are logged and collected but
/// never interrupt the run.
///
/// # Errors
///
/// Returns [`SwarmError::InvalidConfig`] when validation fails, or the
/// construction error from the simulator or policy loader.
pub fn run_scenario(config: &ScenarioConfig) -> Result<RunOutput, SwarmError> {
    let mut sim = config.build()?;
    let hours = config.simulation.hours;
    let detector = RuleBasedDetector::default();

    info!(
        agents = config.simulation.agents,
        hours,
        policy = %config.policy.kind,
        "scenario loaded"
    );

    let mut steps = Vec::with_capacity(hours);
    let mut alerts = Vec::new();
    for hour in 0..hours {
        steps.push(sim.step(hour));
        for alert in detector.detect(&sim.snapshots()) {
            warn!(
                agent = alert.agent_id,
                hour,
                severity = ?alert.severity,
                "{}",
                alert.description
            );
            alerts.push(alert);
        }
    }

    let result = sim.results().clone();
    let kpi = KpiReport::from_results(&result, &sim.settings().economics);
    info!(
        solar_utilization_pct = kpi.solar_utilization_pct,
        alerts = alerts.len(),
        "scenario finished"
    );

    Ok(RunOutput {
        steps,
        result,
        kpi,
        alerts,
        snapshots: sim.snapshots(),
        history: sim.history(),
    })
}

#[cfg(test)]
mod tests {
    use super::run_scenario;
    use crate::config::ScenarioConfig;
    use crate::io::export::write_csv;

    #[test]
    fn same_scenario_and_seed_is_deterministic() {
        let mut scenario = ScenarioConfig::baseline();
        scenario.simulation.agents = 6;
        scenario.simulation.seed = 777;

        let run_a = run_scenario(&scenario).expect("first run should succeed");
        let run_b = run_scenario(&scenario).expect("second run should succeed");

        let mut out_a = Vec::new();
        write_csv(&run_a.steps, &mut out_a).expect("first export should succeed");
        let mut out_b = Vec::new();
        write_csv(&run_b.steps, &mut out_b).expect("second export should succeed");

        assert_eq!(out_a, out_b);
        assert_eq!(run_a.result, run_b.result);
    }

    #[test]
    fn runs_configured_hours() {
        let mut scenario = ScenarioConfig::baseline();
        scenario.simulation.hours = 30;
        let out = run_scenario(&scenario).expect("run should succeed");
        assert_eq!(out.steps.len(), 30);
        assert_eq!(out.result.len(), 30);
        assert_eq!(out.steps[29].hour, 29);
        assert_eq!(out.history.len(), 30);
        assert_eq!(out.snapshots.len(), 10);
        assert!(out.snapshots.iter().all(|s| s.hour == 5));
    }

    #[test]
    fn panel_failure_raises_daylight_alerts() {
        let out = run_scenario(&ScenarioConfig::panel_failure()).expect("run should succeed");
        assert!(
            out.alerts
                .iter()
                .any(|a| a.kind == crate::anomaly::AnomalyKind::LowProduction)
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut scenario = ScenarioConfig::baseline();
        scenario.simulation.hours = 0;
        assert!(run_scenario(&scenario).is_err());
    }
}
