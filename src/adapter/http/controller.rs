// src/adapter/http/controller.rs

use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::error;

use crate::adapter::http::middleware::ProjectToken;
use crate::domain::error::SentinelError;
use crate::scheduler::sweeper::Sweeper;
use crate::usecase::ingest_pulse::{IngestPulse, PulseRequest};
use crate::usecase::register_config::{RegisterConfig, RegisterRequest};
use crate::usecase::status_snapshot::StatusSnapshot;
use crate::usecase::toggle_maintenance::{MaintenanceRequest, ToggleMaintenance};

/// Estado compartido inyectado en los handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestPulse>,
    pub register: Arc<RegisterConfig>,
    pub maintenance: Arc<ToggleMaintenance>,
    pub status: Arc<StatusSnapshot>,
    pub sweeper: Arc<Sweeper>,
}

// Respuesta de error uniforme
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
}

impl IntoResponse for SentinelError {
    fn into_response(self) -> Response {
        let status = match &self {
            SentinelError::Unauthorized => StatusCode::UNAUTHORIZED,
            SentinelError::Forbidden(_) => StatusCode::FORBIDDEN,
            SentinelError::NotFound(_) => StatusCode::NOT_FOUND,
            SentinelError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SentinelError::Conflict(_) | SentinelError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
        }
        let body = ErrorBody { success: false, error: self.code(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: JsonValue) -> Result<T, SentinelError> {
    serde_json::from_value(body)
        .map_err(|e| SentinelError::InvalidRequest(format!("malformed body: {}", e)))
}

/// POST /api/pulse
pub async fn ingest_pulse(
    Extension(state): Extension<AppState>,
    Extension(ProjectToken(token)): Extension<ProjectToken>,
    Json(body): Json<JsonValue>,
) -> Result<Response, SentinelError> {
    let req: PulseRequest = parse_body(body)?;
    let ack = state.ingest.execute(&token, req).await?;
    Ok(Json(json!({
        "success": true,
        "check_id": ack.check_id,
        "status": ack.status,
        "timestamp": ack.timestamp,
    }))
    .into_response())
}

/// PUT /api/config
pub async fn register_config(
    Extension(state): Extension<AppState>,
    Extension(ProjectToken(token)): Extension<ProjectToken>,
    Json(body): Json<JsonValue>,
) -> Result<Response, SentinelError> {
    let req: RegisterRequest = parse_body(body)?;
    let ack = state.register.execute(&token, req).await?;
    Ok(Json(json!({
        "success": true,
        "project_id": ack.project_id,
        "checks_registered": ack.checks_registered,
    }))
    .into_response())
}

/// POST /api/maintenance/:project_id. Cuerpo opcional; sin `enabled` invierte
/// la ventana actual.
pub async fn toggle_maintenance(
    Extension(state): Extension<AppState>,
    Extension(ProjectToken(token)): Extension<ProjectToken>,
    Path(project_id): Path<String>,
    body: Option<Json<JsonValue>>,
) -> Result<Response, SentinelError> {
    let req: MaintenanceRequest = match body {
        Some(Json(value)) => parse_body(value)?,
        None => MaintenanceRequest::default(),
    };
    let ack = state.maintenance.execute(&token, &project_id, req).await?;
    Ok(Json(json!({
        "success": true,
        "project_id": ack.project_id,
        "enabled": ack.enabled,
        "maintenance_until": ack.maintenance_until,
    }))
    .into_response())
}

/// GET /api/status
pub async fn status_all(
    Extension(state): Extension<AppState>,
) -> Result<Response, SentinelError> {
    let projects = state.status.all().await?;
    Ok(Json(json!({ "success": true, "projects": projects })).into_response())
}

/// GET /api/status/:project_id
pub async fn status_project(
    Extension(state): Extension<AppState>,
    Path(project_id): Path<String>,
) -> Result<Response, SentinelError> {
    let detail = state.status.project(&project_id).await?;
    Ok(Json(json!({ "success": true, "project": detail })).into_response())
}

/// POST /api/tick: entrada para schedulers externos; sin cuerpo.
pub async fn tick(Extension(state): Extension<AppState>) -> Response {
    let summary = state.sweeper.run_tick().await;
    Json(json!({
        "success": true,
        "swept": summary.swept,
        "alerts": summary.alerts,
        "pruned": summary.pruned,
    }))
    .into_response()
}
