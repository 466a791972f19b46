// src/scheduler/sweeper.rs
//! Sweeper: el tick periódico que sintetiza eventos `dead` para heartbeats
//! vencidos, poda el log y registra su propio latido.
//!
//! Cada tick ejecuta, best-effort y con aislamiento por check:
//! 1. Self-pulse del check `watch-dog:self-health` (escritura directa de la
//!    fila; la señal es "el tick corrió", no la máquina de estados).
//! 2. Barrido de vencidos: heartbeats monitoreados, no muertos, con
//!    `last_seen + interval + grace < now` estricto.
//! 3. Poda de logs con más de 7 días.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::domain::model::check::Check;
use crate::domain::model::{CheckKind, CheckStatus, LogRecord, PulseEvent};
use crate::domain::transition::transition;
use crate::repository::settings::SettingsProvider;
use crate::repository::store::Store;
use crate::service::clock::Clock;
use crate::service::notifier::AlertNotifier;

pub const SELF_HEALTH_PROJECT: &str = "watch-dog";
pub const SELF_HEALTH_CHECK: &str = "self-health";
pub const SELF_HEALTH_CHECK_ID: &str = "watch-dog:self-health";

/// 7 días en segundos.
pub const LOG_RETENTION_SECONDS: i64 = 604_800;

const MAX_COMMIT_RETRIES: u32 = 2;

#[derive(Debug, Default, Clone, Copy)]
pub struct SweepSummary {
    /// Checks marcados como muertos en este tick.
    pub swept: usize,
    /// Alertas entregadas al notificador.
    pub alerts: usize,
    /// Filas de log eliminadas.
    pub pruned: u64,
}

pub struct Sweeper {
    store: Arc<dyn Store>,
    notifier: Arc<dyn AlertNotifier>,
    settings: Arc<SettingsProvider>,
    clock: Arc<dyn Clock>,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn AlertNotifier>,
        settings: Arc<SettingsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, notifier, settings, clock }
    }

    /// Un tick completo. Nunca falla: los errores por check se loguean y el
    /// barrido continúa con el resto.
    pub async fn run_tick(&self) -> SweepSummary {
        let now = self.clock.now();
        let mut summary = SweepSummary::default();

        if let Err(e) = self.self_pulse(now).await {
            warn!(error = %e, "self-health pulse failed");
        }

        let candidates = match self.store.list_sweep_candidates().await {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "sweep scan failed; skipping tick");
                Vec::new()
            }
        };

        for check in candidates {
            if check.id == SELF_HEALTH_CHECK_ID
                || check.status == CheckStatus::Dead
                || check.deadline() >= now
            {
                continue;
            }
            match self.mark_dead(&check, now).await {
                Ok(alerted) => {
                    summary.swept += 1;
                    if alerted {
                        summary.alerts += 1;
                    }
                }
                Err(e) => {
                    warn!(check_id = %check.id, error = %e, "failed to mark check dead");
                }
            }
        }

        match self.store.prune_logs(now - LOG_RETENTION_SECONDS).await {
            Ok(pruned) => summary.pruned = pruned,
            Err(e) => warn!(error = %e, "log pruning failed"),
        }

        info!(
            swept = summary.swept,
            alerts = summary.alerts,
            pruned = summary.pruned,
            "sweep finished"
        );
        summary
    }

    /// Marca el check interno como vivo escribiendo la fila directamente.
    async fn self_pulse(&self, now: i64) -> anyhow::Result<()> {
        for _ in 0..=MAX_COMMIT_RETRIES {
            match self.store.get_check(SELF_HEALTH_CHECK_ID).await? {
                Some(existing) => {
                    let mut updated = existing.clone();
                    updated.status = CheckStatus::Ok;
                    updated.failure_count = 0;
                    updated.last_seen = now.max(existing.last_seen);
                    updated.last_message = Some("tick".into());
                    if self.store.update_check(updated, existing.version).await? {
                        self.append_self_log(now).await?;
                        return Ok(());
                    }
                }
                None => {
                    let mut check = Check::new(
                        SELF_HEALTH_PROJECT,
                        SELF_HEALTH_CHECK,
                        CheckKind::Heartbeat,
                        now,
                    )?;
                    check.display_name = "Watch-Dog Self Health".into();
                    check.interval = 60;
                    check.grace = 120;
                    check.status = CheckStatus::Ok;
                    check.last_seen = now;
                    check.last_message = Some("tick".into());
                    if self.store.insert_check(check).await.is_ok() {
                        self.append_self_log(now).await?;
                        return Ok(());
                    }
                }
            }
        }
        anyhow::bail!("self-health row kept changing underneath the sweeper")
    }

    async fn append_self_log(&self, now: i64) -> anyhow::Result<()> {
        self.store
            .append_log(LogRecord::new(SELF_HEALTH_CHECK_ID, "ok", 0, Some("tick".into()), now))
            .await
    }

    /// Sintetiza el evento `dead` y lo confirma por el mismo camino que un
    /// pulso real: transición, commit optimista, log, notificación.
    async fn mark_dead(&self, check: &Check, now: i64) -> anyhow::Result<bool> {
        let project = self
            .store
            .get_project(&check.project_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("orphan check '{}': project missing", check.id))?;
        let policy = self.settings.alert_policy().await;

        let mut attempts = 0;
        loop {
            let current = match self.store.get_check(&check.id).await? {
                Some(c) => c,
                // Borrado entre el scan y el commit.
                None => return Ok(false),
            };
            // Otro worker (o un pulso tardío) puede haber movido la fila.
            if current.status == CheckStatus::Dead || current.deadline() >= now {
                return Ok(false);
            }

            let event = PulseEvent::Dead { elapsed: now - current.last_seen };
            let (next, alert) = transition(&current, &project, &event, &policy, now);

            if self.store.update_check(next, current.version).await? {
                self.store
                    .append_log(LogRecord::new(
                        check.id.as_str(),
                        event.status_label(),
                        0,
                        Some(format!("heartbeat missed; last seen {}s ago", now - current.last_seen)),
                        now,
                    ))
                    .await?;
                let alerted = alert.is_some();
                if let Some(alert) = alert {
                    self.notifier.deliver(&alert).await;
                }
                return Ok(alerted);
            }

            attempts += 1;
            if attempts > MAX_COMMIT_RETRIES {
                anyhow::bail!("optimistic update on '{}' kept losing the race", check.id);
            }
        }
    }

    /// Loop interno de ticks para despliegues sin scheduler externo.
    pub async fn run_forever(self: Arc<Self>, period_seconds: u64, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(Duration::from_secs(period_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_seconds, "sweeper loop started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_tick().await;
                }
                _ = shutdown.recv() => {
                    info!("sweeper loop stopping");
                    break;
                }
            }
        }
    }
}
