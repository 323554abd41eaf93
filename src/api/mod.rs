//! REST API for a completed swarm run.
//!
//! Provides four GET endpoints:
//! - `/state`: scenario, KPI report, latest tick and agent states
//! - `/telemetry`: per-tick reports with optional hour range filtering
//! - `/anomalies`: alerts raised during the run
//! - `/forecast`: 24-hour production forecast from the run history

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use tracing::info;

use crate::config::ScenarioConfig;
use crate::devices::RooftopSolar;
use crate::runner::RunOutput;

pub use types::{
    AnomalyQuery, AnomalyResponse, ErrorResponse, ForecastQuery, ForecastResponse, StateResponse,
    TelemetryQuery,
};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; all data
/// is read-only.
pub struct AppState {
    /// Scenario used for this run.
    pub config: ScenarioConfig,
    /// Everything the run produced.
    pub output: RunOutput,
    /// Solar profile the forecaster falls back to.
    pub solar: RooftopSolar,
    /// First hour covered by `/forecast`.
    pub forecast_start: DateTime<Utc>,
}

impl AppState {
    /// Wraps a finished run. Forecasts start at the top of the next hour.
    pub fn new(config: ScenarioConfig, output: RunOutput) -> Self {
        let now = Utc::now();
        let forecast_start = now
            .duration_trunc(TimeDelta::hours(1))
            .map_or(now, |t| t + TimeDelta::hours(1));
        Self {
            solar: config.settings().solar,
            config,
            output,
            forecast_start,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/anomalies", get(handlers::get_anomalies))
        .route("/forecast", get(handlers::get_forecast))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
