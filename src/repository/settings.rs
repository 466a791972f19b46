// src/repository/settings.rs

use std::sync::Arc;

use tracing::warn;

use crate::domain::model::AlertLevel;
use crate::domain::transition::AlertPolicy;
use crate::repository::store::Store;

pub const KEY_API_TOKEN: &str = "api_token";
pub const KEY_CHANNEL_CRITICAL: &str = "channel_critical";
pub const KEY_CHANNEL_SUCCESS: &str = "channel_success";
pub const KEY_CHANNEL_WARNING: &str = "channel_warning";
pub const KEY_CHANNEL_INFO: &str = "channel_info";
pub const KEY_SILENCE_PERIOD: &str = "silence_period_seconds";

/// Valores usados cuando la fila de settings no existe en el store.
/// Se siembran desde la configuración de la aplicación al arrancar.
#[derive(Debug, Clone)]
pub struct NotifyFallback {
    pub api_token: String,
    pub channel_critical: String,
    pub channel_success: String,
    pub channel_warning: String,
    pub channel_info: String,
    pub silence_period_seconds: i64,
}

impl Default for NotifyFallback {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            channel_critical: String::new(),
            channel_success: String::new(),
            channel_warning: String::new(),
            channel_info: String::new(),
            silence_period_seconds: 3600,
        }
    }
}

/// Credenciales y mapeo de canales resueltos para una decisión de notificación.
#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub api_token: String,
    pub channel_critical: String,
    pub channel_success: String,
    pub channel_warning: String,
    pub channel_info: String,
}

impl NotifySettings {
    /// Ruteo nivel → canal. `warning` comparte destino con `critical`;
    /// la separación queda como cambio de settings, no de código.
    pub fn channel_for(&self, level: AlertLevel) -> &str {
        match level {
            AlertLevel::Critical | AlertLevel::Warning => &self.channel_critical,
            AlertLevel::Recovery => &self.channel_success,
            AlertLevel::Info => &self.channel_info,
        }
    }
}

/// Lectura tipada de settings: la fila del store gana; si falta, se usa el
/// fallback de configuración. Se consulta en cada decisión de notificación
/// para que los cambios del administrador apliquen sin reinicio.
pub struct SettingsProvider {
    store: Arc<dyn Store>,
    fallback: NotifyFallback,
}

impl SettingsProvider {
    pub fn new(store: Arc<dyn Store>, fallback: NotifyFallback) -> Self {
        Self { store, fallback }
    }

    async fn get_or(&self, key: &str, fallback: &str) -> String {
        match self.store.get_setting(key).await {
            Ok(Some(value)) => value,
            Ok(None) => fallback.to_string(),
            Err(e) => {
                warn!(key, error = %e, "settings read failed; using fallback");
                fallback.to_string()
            }
        }
    }

    pub async fn notify_settings(&self) -> NotifySettings {
        NotifySettings {
            api_token: self.get_or(KEY_API_TOKEN, &self.fallback.api_token).await,
            channel_critical: self
                .get_or(KEY_CHANNEL_CRITICAL, &self.fallback.channel_critical)
                .await,
            channel_success: self
                .get_or(KEY_CHANNEL_SUCCESS, &self.fallback.channel_success)
                .await,
            channel_warning: self
                .get_or(KEY_CHANNEL_WARNING, &self.fallback.channel_warning)
                .await,
            channel_info: self.get_or(KEY_CHANNEL_INFO, &self.fallback.channel_info).await,
        }
    }

    /// Período de silencio global; el cooldown por check tiene precedencia
    /// (ver la máquina de estados), nunca se suman.
    pub async fn alert_policy(&self) -> AlertPolicy {
        let raw = self.get_or(KEY_SILENCE_PERIOD, "").await;
        let silence_period = raw
            .parse::<i64>()
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(self.fallback.silence_period_seconds);
        AlertPolicy { silence_period }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::store::InMemoryStore;

    #[tokio::test]
    async fn store_rows_win_over_fallback() {
        let store = Arc::new(InMemoryStore::new());
        store.put_setting(KEY_CHANNEL_CRITICAL, "#alerts", 0).await.unwrap();
        store.put_setting(KEY_SILENCE_PERIOD, "120", 0).await.unwrap();

        let fallback = NotifyFallback {
            channel_critical: "#fallback".into(),
            ..NotifyFallback::default()
        };
        let provider = SettingsProvider::new(store, fallback);

        let ns = provider.notify_settings().await;
        assert_eq!(ns.channel_critical, "#alerts");
        assert_eq!(provider.alert_policy().await.silence_period, 120);
    }

    #[tokio::test]
    async fn defaults_apply_when_rows_missing() {
        let store = Arc::new(InMemoryStore::new());
        let provider = SettingsProvider::new(store, NotifyFallback::default());

        let ns = provider.notify_settings().await;
        assert!(ns.api_token.is_empty());
        assert_eq!(provider.alert_policy().await.silence_period, 3600);
    }

    #[tokio::test]
    async fn warning_routes_to_critical_channel() {
        let ns = NotifySettings {
            api_token: "xoxb".into(),
            channel_critical: "#crit".into(),
            channel_success: "#ok".into(),
            channel_warning: "#warn".into(),
            channel_info: "#info".into(),
        };
        assert_eq!(ns.channel_for(AlertLevel::Warning), "#crit");
        assert_eq!(ns.channel_for(AlertLevel::Recovery), "#ok");
        assert_eq!(ns.channel_for(AlertLevel::Info), "#info");
    }
}
