// src/usecase/register_config.rs
//! Registro idempotente de proyecto y reglas de checks.
//!
//! Los atributos de regla (interval, grace, threshold, cooldown) se upsertean;
//! los atributos de estado quedan intactos para filas existentes y se
//! inicializan limpios para filas nuevas.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::SentinelError;
use crate::domain::model::check::{
    check_id, Check, CheckKind, DEFAULT_COOLDOWN, DEFAULT_GRACE, DEFAULT_INTERVAL,
    DEFAULT_THRESHOLD,
};
use crate::domain::model::Project;
use crate::repository::store::Store;
use crate::service::clock::Clock;
use crate::usecase::authorize_project;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckDefinition {
    pub name: String,
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub interval: Option<i64>,
    pub grace: Option<i64>,
    pub threshold: Option<u32>,
    pub cooldown: Option<i64>,
    pub monitor: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Opcional: el SDK cliente manda solo `{"checks": [...]}` y el proyecto
    /// se resuelve por token.
    pub project_id: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub checks: Vec<CheckDefinition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterAck {
    pub project_id: String,
    pub checks_registered: usize,
}

pub struct RegisterConfig {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl RegisterConfig {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn execute(
        &self,
        token: &str,
        req: RegisterRequest,
    ) -> Result<RegisterAck, SentinelError> {
        if token.is_empty() {
            return Err(SentinelError::Unauthorized);
        }
        let now = self.clock.now();

        let project = self.resolve_or_create_project(token, &req, now).await?;

        let mut registered = 0;
        for def in &req.checks {
            self.upsert_check(&project, def, now).await?;
            registered += 1;
        }

        info!(project_id = %project.id, checks = registered, "configuration registered");
        Ok(RegisterAck { project_id: project.id, checks_registered: registered })
    }

    async fn resolve_or_create_project(
        &self,
        token: &str,
        req: &RegisterRequest,
        now: i64,
    ) -> Result<Project, SentinelError> {
        match req.project_id.as_deref() {
            Some(id) => {
                if id.trim().is_empty() {
                    return Err(SentinelError::InvalidRequest("project_id must be non-empty".into()));
                }
                match self.store.get_project(id).await? {
                    Some(existing) => {
                        if existing.token != token {
                            return Err(SentinelError::Forbidden(id.to_string()));
                        }
                        // Upsert preservando maintenance_until y created_at.
                        let mut updated = existing.clone();
                        if let Some(name) = &req.display_name {
                            updated.display_name = name.clone();
                        }
                        self.store.upsert_project(updated.clone()).await?;
                        Ok(updated)
                    }
                    None => {
                        let display = req.display_name.clone().unwrap_or_else(|| id.to_string());
                        let project = Project::new(id, token, display, now);
                        self.store.upsert_project(project.clone()).await?;
                        info!(project_id = %project.id, "project registered");
                        Ok(project)
                    }
                }
            }
            // Sin project_id solo se puede actualizar un proyecto existente.
            None => authorize_project(self.store.as_ref(), token, None).await,
        }
    }

    async fn upsert_check(
        &self,
        project: &Project,
        def: &CheckDefinition,
        now: i64,
    ) -> Result<(), SentinelError> {
        let kind = CheckKind::parse(&def.kind).ok_or_else(|| {
            SentinelError::InvalidRequest(format!(
                "check type must be 'heartbeat' or 'event', got '{}'",
                def.kind
            ))
        })?;
        if def.threshold == Some(0) {
            return Err(SentinelError::InvalidRequest("threshold must be positive".into()));
        }
        if def.interval.is_some_and(|v| v < 0)
            || def.grace.is_some_and(|v| v < 0)
            || def.cooldown.is_some_and(|v| v < 0)
        {
            return Err(SentinelError::InvalidRequest(
                "interval, grace and cooldown must be non-negative".into(),
            ));
        }

        let cid = check_id(&project.id, &def.name)?;

        // Reintento acotado: el registro puede correr contra la máquina de
        // estados escribiendo la misma fila.
        for _ in 0..=2 {
            match self.store.get_check(&cid).await? {
                Some(existing) => {
                    let mut updated = existing.clone();
                    updated.kind = kind;
                    updated.interval = def.interval.unwrap_or(DEFAULT_INTERVAL);
                    updated.grace = def.grace.unwrap_or(DEFAULT_GRACE);
                    updated.threshold = def.threshold.unwrap_or(DEFAULT_THRESHOLD);
                    updated.cooldown = def.cooldown.unwrap_or(DEFAULT_COOLDOWN);
                    updated.monitor = def.monitor.unwrap_or(existing.monitor);
                    if let Some(name) = &def.display_name {
                        updated.display_name = name.clone();
                    }
                    if self.store.update_check(updated, existing.version).await? {
                        return Ok(());
                    }
                }
                None => {
                    let mut check = Check::new(project.id.as_str(), def.name.as_str(), kind, now)?;
                    check.interval = def.interval.unwrap_or(DEFAULT_INTERVAL);
                    check.grace = def.grace.unwrap_or(DEFAULT_GRACE);
                    check.threshold = def.threshold.unwrap_or(DEFAULT_THRESHOLD);
                    check.cooldown = def.cooldown.unwrap_or(DEFAULT_COOLDOWN);
                    check.monitor = def.monitor.unwrap_or(true);
                    if let Some(name) = &def.display_name {
                        check.display_name = name.clone();
                    }
                    match self.store.insert_check(check).await {
                        Ok(()) => return Ok(()),
                        // Carrera con otro registro creando la misma fila.
                        Err(_) => continue,
                    }
                }
            }
        }
        Err(SentinelError::Conflict(cid))
    }
}
