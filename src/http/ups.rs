use super::app_error::AppError;
use super::state::HttpServerState;
use crate::datamodel::snapshot::Snapshot;
use crate::telemetry::{MetricValue, MetricView};
use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotResponse {
    pub unit: Option<String>,
    #[schema(value_type = Object)]
    pub values: Snapshot,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetricViewModel {
    pub key: String,
    pub name: String,
    pub icon: String,
    pub unit_of_measurement: String,
    /// Current value, or "unknown"
    #[schema(value_type = Object)]
    pub state: MetricValue,
}

impl MetricViewModel {
    pub async fn from_view(view: &MetricView) -> Self {
        Self {
            key: view.key().to_string(),
            name: view.name(),
            icon: view.icon().to_string(),
            unit_of_measurement: view.unit_of_measurement().to_string(),
            state: view.value().await,
        }
    }
}

/// Latest UPS variables.
///
/// Refreshes from the UPS daemon only when the throttle window expired.
#[utoipa::path(
    get,
    path = "/api/v1/snapshot",
    tag = "UpsApp",
    responses(
        (status = 200, description = "Normalized UPS variables", body = SnapshotResponse),
        (status = 503, description = "UPS integration unavailable")
    )
)]
pub async fn get_snapshot(
    State(state): State<HttpServerState>,
) -> Result<Json<SnapshotResponse>, AppError> {
    let telemetry = state.telemetry.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("UPS integration is not set up".to_string())
    })?;

    let snapshot = telemetry.get_snapshot().await;
    Ok(Json(SnapshotResponse {
        unit: telemetry.target_unit().map(str::to_string),
        values: (*snapshot).clone(),
    }))
}

/// List the configured UPS metrics with their current values.
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "UpsApp",
    responses(
        (status = 200, description = "Configured metrics", body = Vec<MetricViewModel>)
    )
)]
pub async fn list_metrics(State(state): State<HttpServerState>) -> Json<Vec<MetricViewModel>> {
    let mut metrics = Vec::with_capacity(state.metrics.len());
    for view in state.metrics.iter() {
        metrics.push(MetricViewModel::from_view(view).await);
    }
    Json(metrics)
}

/// One configured UPS metric.
#[utoipa::path(
    get,
    path = "/api/v1/metrics/{key}",
    tag = "UpsApp",
    params(
        ("key" = String, Path, description = "Metric key, case-insensitive, e.g. battery_charge")
    ),
    responses(
        (status = 200, description = "Metric", body = MetricViewModel),
        (status = 404, description = "Metric not configured")
    )
)]
pub async fn get_metric(
    State(state): State<HttpServerState>,
    Path(key): Path<String>,
) -> Result<Json<MetricViewModel>, AppError> {
    let view = state
        .find_metric(&key)
        .ok_or_else(|| AppError::NotFound(format!("Metric not configured: {}", key)))?;
    Ok(Json(MetricViewModel::from_view(view).await))
}
