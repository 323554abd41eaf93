//! Integration tests for full swarm runs through the public API.

mod common;

use solar_swarm::SwarmError;
use solar_swarm::agent::{Action, AgentPolicy};
use solar_swarm::anomaly::{AnomalyDetector, RuleBasedDetector};
use solar_swarm::config::ScenarioConfig;
use solar_swarm::forecast::{FORECAST_HOURS, Forecaster, NaiveForecast};
use solar_swarm::runner::run_scenario;
use solar_swarm::sim::{KpiReport, RunControl, SwarmSettings, SwarmSimulator};
use solar_swarm::topology::Topology;

#[test]
fn full_day_produces_one_entry_per_hour() {
    let mut sim = common::default_simulator(10);
    let result = sim.run(24).unwrap();
    assert_eq!(result.solar_used.len(), 24);
    assert_eq!(result.grid_import.len(), 24);
    assert_eq!(result.shared_energy.len(), 24);
}

#[test]
fn solar_used_never_exceeds_production_or_consumption() {
    let mut sim = common::default_simulator(15);
    let result = sim.run(48).unwrap();
    for i in 0..result.len() {
        assert!(result.solar_used[i] <= result.production[i] + 1e-4);
        assert!(result.solar_used[i] <= result.consumption[i] + 1e-4);
        assert!(result.grid_import[i] >= 0.0);
        assert!(
            (result.solar_used[i] + result.grid_import[i] - result.consumption[i]).abs() < 1e-3,
            "hour {i}: solar + grid must cover consumption"
        );
    }
}

#[test]
fn nights_import_everything() {
    let mut sim = common::default_simulator(10);
    let result = sim.run(24).unwrap();
    for hour in [0, 1, 2, 3, 4, 5, 19, 20, 21, 22, 23] {
        assert_eq!(result.production[hour], 0.0, "hour {hour}");
        assert!((result.grid_import[hour] - result.consumption[hour]).abs() < 1e-4);
    }
}

#[test]
fn determinism_same_seed_same_reports() {
    let mut a = common::default_simulator(10);
    let mut b = common::default_simulator(10);
    for hour in 0..24 {
        assert_eq!(a.step(hour), b.step(hour));
    }
}

#[test]
fn kpis_are_finite_and_bounded() {
    let mut sim = common::default_simulator(10);
    let result = sim.run(24).unwrap();
    let kpi = KpiReport::from_results(&result, &sim.settings().economics);
    for pct in [
        kpi.solar_utilization_pct,
        kpi.self_sufficiency_pct,
        kpi.grid_dependency_pct,
    ] {
        assert!(pct.is_finite());
        assert!((0.0..=100.0 + 1e-3).contains(&pct));
    }
    assert!((kpi.self_sufficiency_pct + kpi.grid_dependency_pct - 100.0).abs() < 1e-2);
}

#[test]
fn decisions_cover_every_agent_and_stay_consistent() {
    let mut sim = common::default_simulator(10);
    for hour in 0..24 {
        let report = sim.step(hour);
        assert_eq!(report.agent_decisions.len(), 10);
        for (i, d) in report.agent_decisions.iter().enumerate() {
            assert_eq!(d.agent_id, i);
            assert!(d.amount_kwh >= 0.0);
            match d.action {
                Action::ShareEnergy => {
                    let target = d.target.expect("share needs a target");
                    assert_ne!(target, d.agent_id);
                    assert!(sim.neighborhood().neighbors(d.agent_id).contains(&target));
                }
                _ => assert!(d.target.is_none()),
            }
        }
    }
}

#[test]
fn grid_topology_links_adjacent_cells() {
    let settings = SwarmSettings {
        topology: Topology::Grid { cols: 5, radius: 1.0 },
        ..common::default_settings(20)
    };
    let sim = SwarmSimulator::new(settings, Default::default()).unwrap();
    let corner = sim.neighborhood().neighbors(0);
    assert_eq!(corner.len(), 2);
    assert!(corner.contains(&1) && corner.contains(&5));
    assert_eq!(sim.neighborhood().neighbors(6).len(), 4);
}

#[test]
fn learned_policy_runs_a_full_day() {
    let policy = common::learned_policy();
    assert_eq!(policy.name(), "learned");
    let mut sim = SwarmSimulator::new(common::default_settings(10), policy).unwrap();
    let result = sim.run(24).unwrap();
    assert_eq!(result.len(), 24);
    for a in sim.agents() {
        assert!((0.0..=a.battery_capacity_kwh).contains(&a.battery_level_kwh));
    }
}

#[test]
fn cancelled_run_keeps_completed_ticks() {
    let mut sim = common::default_simulator(4);
    sim.run(3).unwrap();
    let control = RunControl::new();
    control.stop();
    let result = sim.run_with(10, &control).unwrap();
    assert_eq!(result.len(), 3);
}

#[test]
fn zero_agents_or_hours_are_errors() {
    assert!(matches!(
        SwarmSimulator::with_agents(0),
        Err(SwarmError::InvalidAgentCount(0))
    ));
    let mut sim = common::default_simulator(2);
    assert!(matches!(sim.run(0), Err(SwarmError::InvalidHours(0))));
}

#[test]
fn forecast_from_run_history() {
    let mut sim = common::default_simulator(6);
    sim.run(48).unwrap();
    let history = sim.history();
    let start = chrono::Utc::now();
    let points = NaiveForecast::default().predict_24h(start, &history, None);
    assert_eq!(points.len(), FORECAST_HOURS);
    assert!(points.iter().all(|p| p.confidence_lower <= p.confidence_upper));
}

#[test]
fn anomalies_flag_failed_panels_at_noon() {
    let mut cfg = ScenarioConfig::panel_failure();
    cfg.simulation.hours = 13;
    let mut sim = cfg.build().unwrap();
    for hour in 0..13 {
        sim.step(hour);
    }
    let alerts = RuleBasedDetector::default().detect(&sim.snapshots());
    let flagged: Vec<_> = alerts.iter().map(|a| a.agent_id).collect();
    for id in 0..10 {
        if sim.is_panel_failed(id) {
            assert!(flagged.contains(&id), "failed panel {id} not flagged");
        }
    }
}

#[test]
fn presets_change_outcomes() {
    let base = run_scenario(&ScenarioConfig::baseline()).unwrap().kpi;
    let peak = run_scenario(&ScenarioConfig::peak_demand()).unwrap().kpi;
    let cloudy = run_scenario(&ScenarioConfig::cloudy_day()).unwrap().kpi;
    assert!(peak.total_consumption_kwh > base.total_consumption_kwh * 1.5);
    assert!(cloudy.total_production_kwh < base.total_production_kwh * 0.6);
    assert!(peak.grid_dependency_pct > base.grid_dependency_pct);
}

#[test]
fn learned_scenario_loads_weights_from_disk() {
    let mut cfg = common::small_scenario(5, 12);
    cfg.policy.kind = "learned".to_string();
    cfg.policy.weights_path = Some(common::learned_weights_path());
    let out = run_scenario(&cfg).unwrap();
    assert_eq!(out.steps.len(), 12);
}
