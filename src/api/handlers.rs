use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::service_down_fingerprint;
use crate::store::{AlertQuery, AlertStore, StoreError};

/// Application state shared across handlers
pub struct AppState {
    /// `None` when alert persistence is disabled by configuration
    pub store: Option<Arc<AlertStore>>,
}

impl AppState {
    fn store(&self) -> Result<&Arc<AlertStore>, ApiError> {
        self.store.as_ref().ok_or(ApiError::Disabled)
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub alerting_enabled: bool,
}

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    if let Some(store) = &state.store {
        if !store.health_check() {
            return Err(ApiError::Unavailable("alert store unreachable".to_string()));
        }
    }

    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        alerting_enabled: state.store.is_some(),
    }))
}

// ============================================================================
// Alert Queries
// ============================================================================

pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlertQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.store()?.query(&query)?;
    Ok(Json(page))
}

pub async fn active_alerts(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let alerts = state.store()?.active_alerts()?;
    Ok(Json(serde_json::json!({
        "count": alerts.len(),
        "alerts": alerts,
    })))
}

#[derive(Deserialize)]
pub struct StatsParams {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

pub async fn alert_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.store()?.stats(params.start, params.end)?;
    Ok(Json(stats))
}

#[derive(Deserialize)]
pub struct SummariesParams {
    pub date: NaiveDate,
}

pub async fn list_summaries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummariesParams>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = state.store()?.summaries_for_date(params.date)?;
    Ok(Json(serde_json::json!({
        "date": params.date,
        "summaries": summaries,
    })))
}

// ============================================================================
// Alert Mutations
// ============================================================================

#[derive(Deserialize)]
pub struct AcknowledgeRequest {
    pub acknowledged_by: String,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
    Json(request): Json<AcknowledgeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .store()?
        .acknowledge(&alert_id, &request.acknowledged_by, request.reason)?;
    if !found {
        return Err(ApiError::NotFound(format!("Alert '{}' not found", alert_id)));
    }
    Ok(Json(serde_json::json!({ "acknowledged": alert_id })))
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub service: String,
}

/// Manually resolve every firing alert under a service's down fingerprint
pub async fn resolve_service(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResolveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fingerprint = service_down_fingerprint(&request.service);
    let resolved = state
        .store()?
        .resolve_by_fingerprint(&fingerprint, Utc::now())?;
    Ok(Json(serde_json::json!({
        "service": request.service,
        "resolved": resolved,
    })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    /// Alert persistence is disabled by configuration
    Disabled,
    NotFound(String),
    Unavailable(String),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Closed => ApiError::Unavailable(error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Disabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Alerting is not enabled".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
