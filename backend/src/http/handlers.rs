//! HTTP handlers for the REST API.
//!
//! Handlers fetch the cached snapshot and run the aggregation on the blocking
//! pool; the repository is only touched for (re)loads and attendance.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use super::dto::{
    AttendanceSheet, AttendanceSubmission, DashboardData, DatasetInfo, DiagnosticsReport,
    FilterOptions, FilterQuery, HealthResponse, ShipmentPage,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::{AttendanceMonth, AttendanceRecord};
use crate::services::{self, attendance, DatasetSnapshot, FilterSpec};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

async fn snapshot(state: &AppState) -> Result<Arc<DatasetSnapshot>, AppError> {
    Ok(state
        .snapshots
        .get_or_load(state.repository.as_ref())
        .await?)
}

/// Run `f` over the current snapshot on the blocking pool.
async fn with_snapshot<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&DatasetSnapshot) -> Result<T, AppError> + Send + 'static,
{
    let snapshot = snapshot(state).await?;
    tokio::task::spawn_blocking(move || f(snapshot.as_ref()))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
}

fn parse_month(raw: &str) -> Result<AttendanceMonth, AppError> {
    raw.parse()
        .map_err(|e: String| AppError::BadRequest(format!("Invalid month '{}': {}", raw, e)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
        dataset_version: state.snapshots.current().map(|s| s.version.clone()),
    }))
}

// =============================================================================
// Dashboard
// =============================================================================

/// GET /v1/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> HandlerResult<DashboardData> {
    dashboard_for(state, query.to_filter()).await
}

/// POST /v1/dashboard
///
/// Takes the filter as JSON, so list entries may contain commas.
pub async fn post_dashboard(
    State(state): State<AppState>,
    Json(filter): Json<FilterSpec>,
) -> HandlerResult<DashboardData> {
    dashboard_for(state, filter).await
}

async fn dashboard_for(state: AppState, filter: FilterSpec) -> HandlerResult<DashboardData> {
    let config = Arc::clone(&state.config);
    let data = with_snapshot(&state, move |snapshot| {
        Ok(services::compute_dashboard(snapshot, &filter, &config)?)
    })
    .await?;
    Ok(Json(data))
}

/// GET /v1/dashboard/filters
pub async fn get_filter_options(State(state): State<AppState>) -> HandlerResult<FilterOptions> {
    let options = with_snapshot(&state, |snapshot| Ok(services::filter_options(snapshot))).await?;
    Ok(Json(options))
}

// =============================================================================
// Dataset inspection
// =============================================================================

/// GET /v1/shipments
pub async fn get_shipments(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> HandlerResult<ShipmentPage> {
    let filter = query.to_filter();
    let limit = query.limit.unwrap_or(state.config.default_page_limit);
    let page = with_snapshot(&state, move |snapshot| {
        Ok(services::shipment_page(snapshot, &filter, limit)?)
    })
    .await?;
    Ok(Json(page))
}

/// GET /v1/diagnostics
pub async fn get_diagnostics(State(state): State<AppState>) -> HandlerResult<DiagnosticsReport> {
    let report =
        with_snapshot(&state, |snapshot| Ok(services::diagnostics_report(snapshot))).await?;
    Ok(Json(report))
}

/// POST /v1/dataset/refresh
///
/// Drop the cached snapshot and load the provider tables again.
pub async fn refresh_dataset(State(state): State<AppState>) -> HandlerResult<DatasetInfo> {
    let snapshot = state
        .snapshots
        .refresh(state.repository.as_ref())
        .await?;
    Ok(Json(snapshot.info()))
}

// =============================================================================
// Attendance
// =============================================================================

/// GET /v1/attendance/{month}
pub async fn get_attendance_sheet(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> HandlerResult<AttendanceSheet> {
    let month = parse_month(&month)?;
    let snapshot = snapshot(&state).await?;
    let plates = attendance::rental_plates(&snapshot);
    let sheet = attendance::sheet(state.repository.as_ref(), month, plates).await?;
    Ok(Json(sheet))
}

/// PUT /v1/attendance/{month}/{plate}
pub async fn put_attendance(
    State(state): State<AppState>,
    Path((month, plate)): Path<(String, String)>,
    Json(submission): Json<AttendanceSubmission>,
) -> HandlerResult<AttendanceRecord> {
    let month = parse_month(&month)?;
    let record = attendance::submit(state.repository.as_ref(), month, &plate, submission).await?;
    Ok(Json(record))
}
