// src/telemetry/tracing.rs
//! Logging setup.
//!
//! Structured logging only: the fmt subscriber with an env-driven filter.
//! `RUST_LOG` wins when set; otherwise the configured level applies.

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

pub fn init_tracing(cfg: &AppConfig) -> anyhow::Result<()> {
    let default_level = cfg.logging.level.as_deref().unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))
}
