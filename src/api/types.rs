//! API response and query types.
//!
//! Step records reuse [`StepReport`] so field names match the CSV export and
//! the live feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::{AgentSnapshot, Alert, Severity};
use crate::config::ScenarioConfig;
use crate::forecast::ForecastPoint;
use crate::sim::{KpiReport, RunSummary, StepReport};

/// Combined state response: scenario, KPIs, latest tick and agent states.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Scenario the run was built from.
    pub config: ScenarioConfig,
    /// Aggregate KPI report.
    pub kpi: KpiReport,
    /// Headline totals for the run.
    pub summary: RunSummary,
    /// Most recent tick, absent for an empty run.
    pub latest_step: Option<StepReport>,
    /// Agent states after the last tick.
    pub agents: Vec<AgentSnapshot>,
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// First hour (inclusive).
    pub from: Option<usize>,
    /// Last hour (inclusive).
    pub to: Option<usize>,
}

/// Optional filter for the anomalies endpoint.
#[derive(Debug, Deserialize)]
pub struct AnomalyQuery {
    /// Minimum severity to include.
    pub min_severity: Option<Severity>,
}

/// Alerts raised during the run.
#[derive(Debug, Serialize)]
pub struct AnomalyResponse {
    /// Number of alerts returned.
    pub count: usize,
    /// Alerts in detection order.
    pub alerts: Vec<Alert>,
}

/// Optional weather input for the forecast endpoint.
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    /// Cloud cover percentage (0-100).
    pub cloud_cover: Option<f32>,
}

/// 24-hour production forecast for one household.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    /// Time the forecast was produced.
    pub generated_at: DateTime<Utc>,
    /// Hourly points.
    pub forecast: Vec<ForecastPoint>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
