// src/domain/model/log.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registro append-only de cada evento procesado. Se poda a los 7 días.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: Uuid,
    pub check_id: String,
    /// "ok" | "error" | "dead"
    pub status: String,
    /// Latencia reportada por el cliente, en milisegundos (0 si no aplica).
    pub latency: i64,
    pub message: Option<String>,
    pub created_at: i64,
}

impl LogRecord {
    pub fn new(
        check_id: impl Into<String>,
        status: impl Into<String>,
        latency: i64,
        message: Option<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            check_id: check_id.into(),
            status: status.into(),
            latency,
            message,
            created_at,
        }
    }
}
