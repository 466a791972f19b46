// src/usecase/ingest_pulse.rs
//! Ingesta de pulsos: autentica, resuelve el check, corre la transición y
//! confirma fila + log + notificación en ese orden.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::error::SentinelError;
use crate::domain::model::check::check_id;
use crate::domain::model::{CheckStatus, LogRecord, PulseEvent};
use crate::domain::transition::transition;
use crate::repository::settings::SettingsProvider;
use crate::repository::store::Store;
use crate::service::clock::Clock;
use crate::service::notifier::AlertNotifier;
use crate::usecase::authorize_project;

/// Reintentos del commit optimista ante carrera de escritura.
const MAX_COMMIT_RETRIES: u32 = 2;

#[derive(Debug, Clone, Deserialize)]
pub struct PulseRequest {
    pub project_id: Option<String>,
    pub check_name: String,
    /// "ok" | "error"; ausente equivale a "ok".
    pub status: Option<String>,
    pub message: Option<String>,
    /// Milisegundos, si el cliente la reporta.
    pub latency: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PulseAck {
    pub check_id: String,
    pub status: CheckStatus,
    pub timestamp: i64,
}

pub struct IngestPulse {
    store: Arc<dyn Store>,
    notifier: Arc<dyn AlertNotifier>,
    settings: Arc<SettingsProvider>,
    clock: Arc<dyn Clock>,
}

impl IngestPulse {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn AlertNotifier>,
        settings: Arc<SettingsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, notifier, settings, clock }
    }

    pub async fn execute(&self, token: &str, req: PulseRequest) -> Result<PulseAck, SentinelError> {
        if req.check_name.trim().is_empty() {
            return Err(SentinelError::InvalidRequest("check_name is required".into()));
        }

        let project =
            authorize_project(self.store.as_ref(), token, req.project_id.as_deref()).await?;

        let event = match req.status.as_deref().unwrap_or("ok") {
            "ok" => PulseEvent::Ok { message: req.message.clone(), latency: req.latency },
            "error" => PulseEvent::Error { message: req.message.clone(), latency: req.latency },
            other => {
                return Err(SentinelError::InvalidRequest(format!(
                    "status must be 'ok' or 'error', got '{}'",
                    other
                )))
            }
        };

        let cid = check_id(&project.id, &req.check_name)?;
        let now = self.clock.now();
        let policy = self.settings.alert_policy().await;

        // Commit optimista: releer y recalcular la transición si otra
        // escritura ganó la carrera, con reintentos acotados.
        let mut attempts = 0;
        loop {
            let check = self
                .store
                .get_check(&cid)
                .await?
                .ok_or_else(|| SentinelError::NotFound(format!("check '{}'", cid)))?;

            let (next, alert) = transition(&check, &project, &event, &policy, now);
            let resulting_status = next.status;

            if self.store.update_check(next, check.version).await? {
                self.store
                    .append_log(LogRecord::new(
                        cid.as_str(),
                        event.status_label(),
                        event.latency(),
                        req.message.clone(),
                        now,
                    ))
                    .await?;

                if let Some(alert) = alert {
                    info!(
                        check_id = %cid,
                        level = alert.level.as_str(),
                        "transition produced alert"
                    );
                    self.notifier.deliver(&alert).await;
                }

                return Ok(PulseAck { check_id: cid, status: resulting_status, timestamp: now });
            }

            attempts += 1;
            if attempts > MAX_COMMIT_RETRIES {
                warn!(check_id = %cid, "optimistic update lost the race; giving up");
                return Err(SentinelError::Conflict(cid));
            }
        }
    }
}
