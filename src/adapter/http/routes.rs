// src/adapter/http/routes.rs

use axum::{
    extract::Extension,
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};

use crate::adapter::http::controller::{self, AppState};
use crate::adapter::http::middleware::require_project_token;

/// Construye el router HTTP: rutas autenticadas por token de proyecto más las
/// rutas públicas de estado y tick.
pub fn build_router(state: AppState) -> Router {
    let authed = Router::new()
        .route("/api/pulse", post(controller::ingest_pulse))
        .route("/api/config", put(controller::register_config))
        .route("/api/maintenance/:project_id", post(controller::toggle_maintenance))
        .route_layer(from_fn(require_project_token));

    let open = Router::new()
        .route("/api/status", get(controller::status_all))
        .route("/api/status/:project_id", get(controller::status_project))
        .route("/api/tick", post(controller::tick));

    authed.merge(open).layer(Extension(state))
}
