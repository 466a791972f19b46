// src/usecase/toggle_maintenance.rs

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::SentinelError;
use crate::repository::store::Store;
use crate::service::clock::Clock;
use crate::usecase::authorize_project;

const DEFAULT_WINDOW_SECONDS: i64 = 3600;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceRequest {
    /// Duración de la ventana en segundos; ausente = 3600.
    pub duration: Option<i64>,
    /// true activa, false desactiva; ausente invierte el estado actual.
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceAck {
    pub project_id: String,
    pub enabled: bool,
    pub maintenance_until: i64,
}

/// Mantenimiento es supresión, no reset: los contadores de fallos siguen
/// avanzando durante la ventana y no hay alerta retroactiva al salir.
pub struct ToggleMaintenance {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl ToggleMaintenance {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn execute(
        &self,
        token: &str,
        project_id: &str,
        req: MaintenanceRequest,
    ) -> Result<MaintenanceAck, SentinelError> {
        if req.duration.is_some_and(|d| d <= 0) {
            return Err(SentinelError::InvalidRequest("duration must be positive".into()));
        }

        let mut project =
            authorize_project(self.store.as_ref(), token, Some(project_id)).await?;
        let now = self.clock.now();

        let enable = req.enabled.unwrap_or(!project.in_maintenance(now));
        project.maintenance_until = if enable {
            now + req.duration.unwrap_or(DEFAULT_WINDOW_SECONDS)
        } else {
            0
        };
        let until = project.maintenance_until;
        self.store.upsert_project(project).await?;

        info!(project_id, enabled = enable, maintenance_until = until, "maintenance window updated");
        Ok(MaintenanceAck { project_id: project_id.to_string(), enabled: enable, maintenance_until: until })
    }
}
