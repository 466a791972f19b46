// src/service/notifier.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::domain::model::AlertRecord;
use crate::repository::settings::SettingsProvider;

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Frontera de entrega de alertas. La entrega es best-effort: nunca devuelve
/// error al caller; un canal roto no debe revertir la escritura de estado.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn deliver(&self, alert: &AlertRecord);
}

/// Notificador nulo para tests y despliegues sin canal configurado.
pub struct NoopNotifier;

#[async_trait]
impl AlertNotifier for NoopNotifier {
    async fn deliver(&self, alert: &AlertRecord) {
        debug!(check_id = %alert.check_id, level = alert.level.as_str(), "alert dropped (noop notifier)");
    }
}

/// Entrega vía chat.postMessage de Slack. Las credenciales y el mapeo de
/// canales se resuelven en cada entrega, así los cambios del administrador
/// aplican sin reinicio.
pub struct SlackNotifier {
    client: Client,
    settings: Arc<SettingsProvider>,
}

impl SlackNotifier {
    pub fn new(settings: Arc<SettingsProvider>) -> Self {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, settings }
    }

    fn render_time(ts: i64) -> String {
        match Utc.timestamp_opt(ts, 0).single() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => ts.to_string(),
        }
    }

    /// Payload estructurado: header con emoji, pares nivel/hora y
    /// proyecto/check, bloque de mensaje, contexto con metadata y footer con
    /// el check_id. `text` queda como fallback plano para previews móviles.
    fn build_payload(alert: &AlertRecord, channel: &str) -> JsonValue {
        let mut blocks = vec![
            json!({
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!("{} {}", alert.level.emoji(), alert.title),
                    "emoji": true
                }
            }),
            json!({
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Level:*\n{}", alert.level.as_str()) },
                    { "type": "mrkdwn", "text": format!("*Time:*\n{}", Self::render_time(alert.triggered_at)) }
                ]
            }),
            json!({
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Project:*\n{}", alert.project_name) },
                    { "type": "mrkdwn", "text": format!("*Check:*\n{}", alert.check_name) }
                ]
            }),
            json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": alert.message.clone() }
            }),
        ];

        if !alert.metadata.is_empty() {
            let detail = alert
                .metadata
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join(" · ");
            blocks.push(json!({
                "type": "context",
                "elements": [{ "type": "mrkdwn", "text": detail }]
            }));
        }

        blocks.push(json!({
            "type": "context",
            "elements": [{ "type": "mrkdwn", "text": alert.check_id.clone() }]
        }));

        json!({
            "channel": channel,
            "text": alert.message.clone(),
            "blocks": blocks
        })
    }
}

#[async_trait]
impl AlertNotifier for SlackNotifier {
    async fn deliver(&self, alert: &AlertRecord) {
        let ns = self.settings.notify_settings().await;
        if ns.api_token.is_empty() {
            debug!(check_id = %alert.check_id, "alert dropped: no API token configured");
            return;
        }
        let channel = ns.channel_for(alert.level);
        if channel.is_empty() {
            debug!(
                check_id = %alert.check_id,
                level = alert.level.as_str(),
                "alert dropped: no channel configured for level"
            );
            return;
        }

        let payload = Self::build_payload(alert, channel);

        // Entrega at-least-once sin reintentos: ante fallo transitorio la
        // alerta se pierde y el próximo fallo re-alerta al vencer el cooldown.
        match self
            .client
            .post(SLACK_POST_MESSAGE_URL)
            .bearer_auth(&ns.api_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => {
                let status = resp.status();
                if !status.is_success() {
                    warn!(%status, check_id = %alert.check_id, "chat API returned error status");
                    return;
                }
                match resp.json::<JsonValue>().await {
                    Ok(body) if body.get("ok").and_then(JsonValue::as_bool) == Some(false) => {
                        let reason = body
                            .get("error")
                            .and_then(JsonValue::as_str)
                            .unwrap_or("unknown");
                        warn!(reason, check_id = %alert.check_id, "chat API rejected message");
                    }
                    Ok(_) => {
                        info!(
                            check_id = %alert.check_id,
                            level = alert.level.as_str(),
                            channel,
                            "alert delivered"
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, check_id = %alert.check_id, "unreadable chat API response");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, check_id = %alert.check_id, "alert delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AlertLevel, Check, CheckKind, Project};

    fn sample_alert() -> AlertRecord {
        let project = Project::new("proj", "secret-token-0123", "Proyecto", 0);
        let mut check = Check::new("proj", "db", CheckKind::Heartbeat, 0).unwrap();
        check.failure_count = 3;
        AlertRecord::for_check(
            AlertLevel::Critical,
            "db is down",
            "heartbeat missed; last seen 120s ago",
            &check,
            &project,
            1_000,
        )
    }

    #[test]
    fn payload_carries_fallback_text_and_footer() {
        let alert = sample_alert();
        let payload = SlackNotifier::build_payload(&alert, "#alerts");

        assert_eq!(payload["channel"], "#alerts");
        assert_eq!(payload["text"], "heartbeat missed; last seen 120s ago");

        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks[0]["type"], "header");
        let footer = &blocks[blocks.len() - 1];
        assert_eq!(footer["elements"][0]["text"], "proj:db");
    }

    #[test]
    fn header_includes_level_emoji() {
        let alert = sample_alert();
        let payload = SlackNotifier::build_payload(&alert, "#alerts");
        let header = payload["blocks"][0]["text"]["text"].as_str().unwrap();
        assert!(header.starts_with("🔴"));
    }
}
