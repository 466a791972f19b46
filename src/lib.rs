// src/lib.rs
//! Watch-Dog Sentinel: servicio de monitoreo pasivo tipo "dead man's switch".
//!
//! Los servicios monitoreados emiten pulsos periódicos; cuando un pulso se
//! atrasa o reporta fallo, la máquina de estados decide si corresponde emitir
//! una alerta hacia el canal de chat configurado.

pub mod adapter;
pub mod config;
pub mod domain;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod telemetry;
pub mod usecase;
