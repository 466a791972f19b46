// src/domain/error.rs

use thiserror::Error;

/// Taxonomía de errores visible a través de las operaciones del núcleo.
///
/// La máquina de estados nunca produce errores (es una función total); estas
/// variantes nacen en los casos de uso y el adaptador HTTP las traduce a
/// códigos de estado.
#[derive(Error, Debug)]
pub enum SentinelError {
    /// No se presentó token de autenticación.
    #[error("unauthorized: no token presented")]
    Unauthorized,

    /// El token presentado no corresponde al proyecto destino.
    #[error("forbidden: token does not match project '{0}'")]
    Forbidden(String),

    /// Proyecto o check referenciado inexistente.
    #[error("not found: {0}")]
    NotFound(String),

    /// Cuerpo malformado o campo requerido ausente.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// La actualización optimista de fila perdió la carrera (agotados los
    /// reintentos). El próximo pulso volverá a observar y re-emitir.
    #[error("conflict: concurrent update on check '{0}'")]
    Conflict(String),

    /// Fallo transitorio de store o notificador; se loguea, no se reintenta
    /// de punta a punta.
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl SentinelError {
    pub fn code(&self) -> &'static str {
        match self {
            SentinelError::Unauthorized => "unauthorized",
            SentinelError::Forbidden(_) => "forbidden",
            SentinelError::NotFound(_) => "not_found",
            SentinelError::InvalidRequest(_) => "invalid_request",
            SentinelError::Conflict(_) => "conflict",
            SentinelError::Io(_) => "io_error",
        }
    }
}
