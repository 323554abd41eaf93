//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;

use super::AppState;
use super::types::{
    AnomalyQuery, AnomalyResponse, ErrorResponse, ForecastQuery, ForecastResponse, StateResponse,
    TelemetryQuery,
};
use crate::forecast::{Forecaster, NaiveForecast, SinusoidalForecaster, WeatherHint};
use crate::sim::StepReport;

fn bad_request(error: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// Returns scenario, KPI report, latest tick and agent states.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let out = &state.output;
    Json(StateResponse {
        config: state.config.clone(),
        kpi: out.kpi.clone(),
        summary: out.result.summary(),
        latest_step: out.steps.last().cloned(),
        agents: out.snapshots.clone(),
    })
}

/// Returns step reports, optionally filtered by hour range.
///
/// `GET /telemetry` → 200 + `Vec<StepReport>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err(bad_request(format!("`from` ({from}) must be <= `to` ({to})")));
    }

    let steps: Vec<StepReport> = state
        .output
        .steps
        .iter()
        .filter(|r| (from..=to).contains(&r.hour))
        .cloned()
        .collect();

    Ok(Json(steps))
}

/// Returns alerts raised during the run.
///
/// `GET /anomalies` → every alert
/// `GET /anomalies?min_severity=high` → alerts at or above the given severity
pub async fn get_anomalies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnomalyQuery>,
) -> Json<AnomalyResponse> {
    let alerts: Vec<_> = state
        .output
        .alerts
        .iter()
        .filter(|a| query.min_severity.is_none_or(|min| a.severity >= min))
        .cloned()
        .collect();
    Json(AnomalyResponse {
        count: alerts.len(),
        alerts,
    })
}

/// Returns a 24-hour production forecast for one household.
///
/// `GET /forecast` → forecast from the run history
/// `GET /forecast?cloud_cover=40` → derated for 40 % cloud cover
/// `GET /forecast?cloud_cover=150` → 400 + `ErrorResponse`
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForecastQuery>,
) -> impl IntoResponse {
    let weather = match query.cloud_cover {
        Some(pct) if !(0.0..=100.0).contains(&pct) => {
            return Err(bad_request(format!(
                "`cloud_cover` ({pct}) must be between 0 and 100"
            )));
        }
        Some(pct) => Some(WeatherHint::from_percent(pct)),
        None => None,
    };

    let forecaster = NaiveForecast {
        fallback: SinusoidalForecaster {
            solar: state.solar.clone(),
        },
    };
    let forecast =
        forecaster.predict_24h(state.forecast_start, &state.output.history, weather.as_ref());

    Ok(Json(ForecastResponse {
        generated_at: Utc::now(),
        forecast,
    }))
}
