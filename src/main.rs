// src/main.rs
//! Punto de entrada del servicio `watchdog-sentinel`.
//!
//! - Carga configuración e inicializa tracing.
//! - Construye el store, el proveedor de settings, el notificador y los
//!   casos de uso.
//! - Arranca el servidor HTTP (Axum) y el loop del sweeper bajo un JoinSet.
//! - Apagado ordenado vía canal broadcast al recibir ctrl-c.

use std::{net::SocketAddr, sync::Arc};

use tokio::{signal, sync::broadcast, task::JoinSet};
use tracing::{error, info, warn};

use watchdog_sentinel::adapter::http::controller::AppState;
use watchdog_sentinel::adapter::http::routes::build_router;
use watchdog_sentinel::config::AppConfig;
use watchdog_sentinel::repository::settings::SettingsProvider;
use watchdog_sentinel::repository::store::InMemoryStore;
use watchdog_sentinel::scheduler::sweeper::Sweeper;
use watchdog_sentinel::service::clock::SystemClock;
use watchdog_sentinel::service::notifier::SlackNotifier;
use watchdog_sentinel::telemetry;
use watchdog_sentinel::usecase::ingest_pulse::IngestPulse;
use watchdog_sentinel::usecase::register_config::RegisterConfig;
use watchdog_sentinel::usecase::status_snapshot::StatusSnapshot;
use watchdog_sentinel::usecase::toggle_maintenance::ToggleMaintenance;

/// Señal de shutdown compartida entre tareas.
#[derive(Clone)]
struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    fn new() -> Self {
        let (tx, _rx) = broadcast::channel(8);
        Self { tx }
    }
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
    fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

#[tokio::main]
async fn main() {
    // 1) Configuración
    let cfg = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ No se pudo cargar la configuración: {e}");
            std::process::exit(1);
        }
    };

    // 2) Tracing
    if let Err(e) = telemetry::tracing::init_tracing(&cfg) {
        eprintln!("⚠️  Tracing parcial: {e}");
    }

    // 3) Wiring de dependencias
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(SystemClock);
    let settings = Arc::new(SettingsProvider::new(store.clone(), cfg.notify_fallback()));
    let notifier = Arc::new(SlackNotifier::new(settings.clone()));

    let sweeper = Arc::new(Sweeper::new(
        store.clone(),
        notifier.clone(),
        settings.clone(),
        clock.clone(),
    ));
    let state = AppState {
        ingest: Arc::new(IngestPulse::new(
            store.clone(),
            notifier.clone(),
            settings.clone(),
            clock.clone(),
        )),
        register: Arc::new(RegisterConfig::new(store.clone(), clock.clone())),
        maintenance: Arc::new(ToggleMaintenance::new(store.clone(), clock.clone())),
        status: Arc::new(StatusSnapshot::new(store.clone(), clock.clone())),
        sweeper: sweeper.clone(),
    };

    let shutdown = Shutdown::new();
    let mut tasks = JoinSet::new();

    // 4) Servidor HTTP
    {
        let http_addr: SocketAddr = match cfg.http.bind.parse() {
            Ok(addr) => addr,
            Err(e) => {
                error!(bind = %cfg.http.bind, error = %e, "http.bind inválido");
                std::process::exit(1);
            }
        };
        let app = build_router(state);
        let mut rx = shutdown.subscribe();

        tasks.spawn(async move {
            info!(%http_addr, "🌐 HTTP server escuchando");
            let server = axum::Server::bind(&http_addr)
                .serve(app.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = rx.recv().await;
                    info!("🔻 Recibida señal de shutdown para HTTP");
                });
            if let Err(e) = server.await {
                error!(error = ?e, "HTTP server finalizó con error");
            }
        });
    }

    // 5) Loop del sweeper (desactivable cuando hay scheduler externo)
    if cfg.sweep.enabled {
        let rx = shutdown.subscribe();
        let sweeper = sweeper.clone();
        let period = cfg.sweep.interval_seconds;
        tasks.spawn(async move {
            sweeper.run_forever(period, rx).await;
        });
    } else {
        info!("sweeper interno desactivado; se espera POST /api/tick externo");
    }

    // 6) Esperar ctrl-c y apagar
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "no se pudo escuchar ctrl-c");
    }
    info!("🔻 ctrl-c recibido; iniciando apagado ordenado");
    shutdown.trigger();

    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            warn!(error = ?e, "tarea finalizó con error");
        }
    }
    info!("watchdog-sentinel detenido");
}
