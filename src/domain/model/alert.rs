// src/domain/model/alert.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::model::check::Check;
use crate::domain::model::project::Project;

/// Nivel de la alerta; decide el canal de destino en el dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Recovery,
    /// Reservado; la máquina de estados actual no lo emite.
    Info,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "critical",
            AlertLevel::Warning => "warning",
            AlertLevel::Recovery => "recovery",
            AlertLevel::Info => "info",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "🔴",
            AlertLevel::Warning => "🟠",
            AlertLevel::Recovery => "🟢",
            AlertLevel::Info => "🔵",
        }
    }
}

/// Registro estructurado producido por la máquina de estados y entregado al
/// notificador. Autocontenido: lleva todo lo necesario para armar el payload
/// sin volver a leer filas del store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Identificador único (UUID v4) para trazabilidad en logs.
    pub id: String,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub project_name: String,
    pub check_name: String,
    pub check_id: String,
    /// Contexto adicional (threshold, interval, grace, failure_count).
    /// BTreeMap para orden determinista en el payload.
    pub metadata: BTreeMap<String, JsonValue>,
    /// Instante del evento que disparó la alerta (epoch segundos).
    pub triggered_at: i64,
}

impl AlertRecord {
    /// Construye la alerta a partir de las filas involucradas, copiando los
    /// atributos de regla relevantes a `metadata`.
    pub fn for_check(
        level: AlertLevel,
        title: impl Into<String>,
        message: impl Into<String>,
        check: &Check,
        project: &Project,
        now: i64,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("threshold".into(), JsonValue::from(check.threshold));
        metadata.insert("failure_count".into(), JsonValue::from(check.failure_count));
        if check.interval > 0 {
            metadata.insert("interval".into(), JsonValue::from(check.interval));
        }
        if check.grace > 0 {
            metadata.insert("grace".into(), JsonValue::from(check.grace));
        }
        Self {
            id: Uuid::new_v4().to_string(),
            level,
            title: title.into(),
            message: message.into(),
            project_name: project.display_name.clone(),
            check_name: check.display_name.clone(),
            check_id: check.id.clone(),
            metadata,
            triggered_at: now,
        }
    }
}
