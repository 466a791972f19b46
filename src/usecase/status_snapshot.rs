// src/usecase/status_snapshot.rs
//! Vista derivada del estado actual para el dashboard. Solo lectura; nunca
//! expone tokens.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::error::SentinelError;
use crate::domain::model::{Check, CheckKind, CheckStatus, Project};
use crate::repository::store::Store;
use crate::service::clock::Clock;

const RECENT_LOG_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct CheckView {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub last_seen: i64,
    pub failure_count: u32,
    pub last_alert_at: i64,
    pub last_message: Option<String>,
    /// Solo heartbeats monitoreados: si ya pasó la deadline estricta.
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogView {
    pub status: String,
    pub latency: i64,
    pub message: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectStatus {
    pub project_id: String,
    pub display_name: String,
    pub in_maintenance: bool,
    pub maintenance_until: i64,
    pub checks: Vec<CheckView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub status: ProjectStatus,
    pub recent_logs: Vec<LogView>,
}

pub struct StatusSnapshot {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl StatusSnapshot {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn check_view(check: &Check, now: i64) -> CheckView {
        CheckView {
            name: check.name.clone(),
            display_name: check.display_name.clone(),
            kind: check.kind,
            status: check.status,
            last_seen: check.last_seen,
            failure_count: check.failure_count,
            last_alert_at: check.last_alert_at,
            last_message: check.last_message.clone(),
            overdue: check.kind == CheckKind::Heartbeat
                && check.monitor
                && check.deadline() < now,
        }
    }

    async fn project_status(&self, project: &Project, now: i64) -> anyhow::Result<ProjectStatus> {
        let checks = self.store.list_checks(&project.id).await?;
        Ok(ProjectStatus {
            project_id: project.id.clone(),
            display_name: project.display_name.clone(),
            in_maintenance: project.in_maintenance(now),
            maintenance_until: project.maintenance_until,
            checks: checks.iter().map(|c| Self::check_view(c, now)).collect(),
        })
    }

    pub async fn all(&self) -> Result<Vec<ProjectStatus>, SentinelError> {
        let now = self.clock.now();
        let projects = self.store.list_projects().await?;
        let mut out = Vec::with_capacity(projects.len());
        for project in &projects {
            out.push(self.project_status(project, now).await?);
        }
        Ok(out)
    }

    pub async fn project(&self, project_id: &str) -> Result<ProjectDetail, SentinelError> {
        let now = self.clock.now();
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| SentinelError::NotFound(format!("project '{}'", project_id)))?;

        let status = self.project_status(&project, now).await?;
        let mut recent_logs = Vec::new();
        for check in &status.checks {
            let cid = format!("{}:{}", project_id, check.name);
            for log in self.store.recent_logs(&cid, RECENT_LOG_LIMIT).await? {
                recent_logs.push(LogView {
                    status: log.status,
                    latency: log.latency,
                    message: log.message,
                    created_at: log.created_at,
                });
            }
        }
        recent_logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_logs.truncate(RECENT_LOG_LIMIT);

        Ok(ProjectDetail { status, recent_logs })
    }
}
