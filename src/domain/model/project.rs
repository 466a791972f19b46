// src/domain/model/project.rs

use serde::{Deserialize, Serialize};

/// Proyecto: agrupa checks y define el token de autenticación compartido.
///
/// El token es un secreto opaco presentado por los clientes en cada request;
/// se recomienda que tenga al menos 16 caracteres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Identificador corto y único (ej. "billing", "infra").
    pub id: String,

    /// Token secreto del proyecto. No se expone en logs ni en vistas de estado.
    pub token: String,

    /// Nombre legible para humanos (dashboard, notificaciones).
    pub display_name: String,

    /// Ventana de mantenimiento: mientras `now < maintenance_until` se
    /// suprimen las alertas de fallo de todos los checks del proyecto.
    /// 0 = sin ventana activa.
    pub maintenance_until: i64,

    /// Timestamp de registro (epoch segundos). Preservado en upserts.
    pub created_at: i64,
}

impl Project {
    pub fn new(id: impl Into<String>, token: impl Into<String>, display_name: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            token: token.into(),
            display_name: display_name.into(),
            maintenance_until: 0,
            created_at: now,
        }
    }

    /// Indica si la ventana de mantenimiento está activa en el instante dado.
    pub fn in_maintenance(&self, now: i64) -> bool {
        self.maintenance_until > now
    }
}
