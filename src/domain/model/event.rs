// src/domain/model/event.rs

/// Evento de entrada de la máquina de estados.
///
/// Los dos primeros provienen de pulsos reales de clientes; `Dead` es
/// sintetizado por el sweeper cuando un heartbeat se atrasa. Los tres pasan
/// por la misma función de transición, sin ramas según su origen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PulseEvent {
    /// Pulso con status "ok". `latency` en milisegundos, si el cliente la reporta.
    Ok {
        message: Option<String>,
        latency: Option<i64>,
    },
    /// Fallo reportado por el cliente.
    Error {
        message: Option<String>,
        latency: Option<i64>,
    },
    /// Heartbeat vencido; `elapsed` = segundos desde el último pulso recibido.
    Dead { elapsed: i64 },
}

impl PulseEvent {
    /// Status textual con el que el evento queda registrado en el log.
    pub fn status_label(&self) -> &'static str {
        match self {
            PulseEvent::Ok { .. } => "ok",
            PulseEvent::Error { .. } => "error",
            PulseEvent::Dead { .. } => "dead",
        }
    }

    pub fn latency(&self) -> i64 {
        match self {
            PulseEvent::Ok { latency, .. } | PulseEvent::Error { latency, .. } => {
                latency.unwrap_or(0)
            }
            PulseEvent::Dead { .. } => 0,
        }
    }
}
