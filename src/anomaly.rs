//! Advisory anomaly detection over per-agent snapshots.
//!
//! Detectors never block a run. Alerts are reported to the caller, logged,
//! and otherwise ignored by the simulation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};

/// Point-in-time view of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent id.
    pub agent_id: AgentId,
    /// Production (kW).
    pub production: f32,
    /// Consumption (kW).
    pub consumption: f32,
    /// Stored energy (kWh).
    pub battery_level: f32,
    /// `production − consumption`.
    pub net_energy: f32,
    /// Hour of day.
    pub hour: usize,
}

impl AgentSnapshot {
    /// Captures `agent` at `hour`.
    pub fn of(agent: &Agent, hour: usize) -> Self {
        Self {
            agent_id: agent.id,
            production: agent.production_kw,
            consumption: agent.consumption_kw,
            battery_level: agent.battery_level_kwh,
            net_energy: agent.net_energy(),
            hour: hour % 24,
        }
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth a look.
    Low,
    /// Likely a fault.
    Medium,
    /// Needs attention.
    High,
}

/// Kind of abnormal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Little or no production during daylight.
    LowProduction,
    /// Consumption far above household norms.
    HighConsumption,
    /// Battery nearly empty.
    LowBattery,
    /// Production with almost no consumption.
    UnusualPattern,
}

/// One flagged agent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Flagged agent.
    pub agent_id: AgentId,
    /// Detection time.
    pub timestamp: DateTime<Utc>,
    /// What was detected.
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    /// How serious it is.
    pub severity: Severity,
    /// Human-readable detail.
    pub description: String,
    /// Anomaly score; more negative is more abnormal.
    pub score: f32,
}

/// Flags abnormal agent states.
pub trait AnomalyDetector {
    /// Returns alerts for `snapshots`, in snapshot order.
    fn detect(&self, snapshots: &[AgentSnapshot]) -> Vec<Alert>;
}

/// Fixed-threshold detector.
///
/// | rule | condition | severity | score |
/// |---|---|---|---|
/// | low production | 06-18 h and production < 0.5 | medium | -0.3 |
/// | high consumption | consumption > 8 | high | -0.5 |
/// | low battery | battery < 0.1 kWh | high | -0.4 |
/// | unusual pattern | production > 2 and consumption < 0.1 | low | -0.2 |
#[derive(Debug, Clone)]
pub struct RuleBasedDetector {
    /// First daylight hour checked for low production.
    pub daylight_start: usize,
    /// Last daylight hour checked for low production.
    pub daylight_end: usize,
    /// Daylight production floor (kW).
    pub low_production_kw: f32,
    /// Consumption ceiling (kW).
    pub high_consumption_kw: f32,
    /// Battery floor (kWh).
    pub low_battery_kwh: f32,
}

impl Default for RuleBasedDetector {
    fn default() -> Self {
        Self {
            daylight_start: 6,
            daylight_end: 18,
            low_production_kw: 0.5,
            high_consumption_kw: 8.0,
            low_battery_kwh: 0.1,
        }
    }
}

impl RuleBasedDetector {
    fn check(&self, s: &AgentSnapshot, now: DateTime<Utc>, alerts: &mut Vec<Alert>) {
        let mut push = |kind, severity, description: String, score| {
            alerts.push(Alert {
                agent_id: s.agent_id,
                timestamp: now,
                kind,
                severity,
                description,
                score,
            });
        };

        if (self.daylight_start..=self.daylight_end).contains(&s.hour)
            && s.production < self.low_production_kw
        {
            push(
                AnomalyKind::LowProduction,
                Severity::Medium,
                format!("Very low production ({:.2} kWh) during daylight hours", s.production),
                -0.3,
            );
        }
        if s.consumption > self.high_consumption_kw {
            push(
                AnomalyKind::HighConsumption,
                Severity::High,
                format!("Unusually high consumption ({:.2} kWh)", s.consumption),
                -0.5,
            );
        }
        if s.battery_level < self.low_battery_kwh {
            push(
                AnomalyKind::LowBattery,
                Severity::High,
                format!("Battery critically low ({:.2} kWh)", s.battery_level),
                -0.4,
            );
        }
        if s.production > 2.0 && s.consumption < 0.1 {
            push(
                AnomalyKind::UnusualPattern,
                Severity::Low,
                "Production but minimal consumption detected".to_string(),
                -0.2,
            );
        }
    }
}

impl AnomalyDetector for RuleBasedDetector {
    fn detect(&self, snapshots: &[AgentSnapshot]) -> Vec<Alert> {
        let now = Utc::now();
        let mut alerts = Vec::new();
        for s in snapshots {
            self.check(s, now, &mut alerts);
        }
        alerts
    }
}
