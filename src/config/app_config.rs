// src/config/app_config.rs

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::repository::settings::NotifyFallback;

/// Configuración principal de la aplicación. Se carga desde `watchdog.toml`
/// (opcional) y variables de entorno con prefijo `WATCHDOG__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Loop interno de ticks; desactivar cuando un scheduler externo invoca
    /// POST /api/tick.
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { enabled: true, interval_seconds: 60 }
    }
}

/// Semillas para el proveedor de settings; las filas del store tienen
/// precedencia sobre estos valores.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub channel_critical: String,
    #[serde(default)]
    pub channel_success: String,
    #[serde(default)]
    pub channel_warning: String,
    #[serde(default)]
    pub channel_info: String,
    #[serde(default = "default_silence_period")]
    pub silence_period_seconds: i64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            channel_critical: String::new(),
            channel_success: String::new(),
            channel_warning: String::new(),
            channel_info: String::new(),
            silence_period_seconds: default_silence_period(),
        }
    }
}

fn default_silence_period() -> i64 {
    3600
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let built = Config::builder()
            .add_source(File::with_name("watchdog").required(false))
            .add_source(Environment::with_prefix("WATCHDOG").separator("__"))
            .build()?;
        let cfg: AppConfig = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.http.bind.trim().is_empty() {
            anyhow::bail!("http.bind must not be empty");
        }
        if self.sweep.interval_seconds == 0 {
            anyhow::bail!("sweep.interval_seconds must be at least 1");
        }
        if self.notify.silence_period_seconds <= 0 {
            anyhow::bail!("notify.silence_period_seconds must be positive");
        }
        Ok(())
    }

    pub fn notify_fallback(&self) -> NotifyFallback {
        NotifyFallback {
            api_token: self.notify.api_token.clone(),
            channel_critical: self.notify.channel_critical.clone(),
            channel_success: self.notify.channel_success.clone(),
            channel_warning: self.notify.channel_warning.clone(),
            channel_info: self.notify.channel_info.clone(),
            silence_period_seconds: self.notify.silence_period_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig {
            http: HttpConfig::default(),
            sweep: SweepConfig::default(),
            notify: NotifyConfig::default(),
            logging: LoggingConfig::default(),
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sweep.interval_seconds, 60);
        assert_eq!(cfg.notify_fallback().silence_period_seconds, 3600);
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let cfg = AppConfig {
            http: HttpConfig::default(),
            sweep: SweepConfig { enabled: true, interval_seconds: 0 },
            notify: NotifyConfig::default(),
            logging: LoggingConfig::default(),
        };
        assert!(cfg.validate().is_err());
    }
}
