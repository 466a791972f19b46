// tests/register_config_test.rs
//
// Config upserter: creation defaults, idempotence, auth and rule updates
// that leave state attributes untouched.

use std::sync::Arc;

use watchdog_sentinel::domain::error::SentinelError;
use watchdog_sentinel::domain::model::{CheckKind, CheckStatus};
use watchdog_sentinel::repository::settings::{NotifyFallback, SettingsProvider};
use watchdog_sentinel::repository::store::{InMemoryStore, Store};
use watchdog_sentinel::service::clock::ManualClock;
use watchdog_sentinel::service::notifier::NoopNotifier;
use watchdog_sentinel::usecase::ingest_pulse::{IngestPulse, PulseRequest};
use watchdog_sentinel::usecase::register_config::{CheckDefinition, RegisterConfig, RegisterRequest};

const TOKEN: &str = "register-secret-token-9";

fn setup(start: i64) -> (Arc<InMemoryStore>, Arc<ManualClock>, RegisterConfig, IngestPulse) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(start));
    let settings = Arc::new(SettingsProvider::new(store.clone(), NotifyFallback::default()));
    let register = RegisterConfig::new(store.clone(), clock.clone());
    let ingest = IngestPulse::new(store.clone(), Arc::new(NoopNotifier), settings, clock.clone());
    (store, clock, register, ingest)
}

fn minimal_check(name: &str) -> CheckDefinition {
    CheckDefinition {
        name: name.into(),
        display_name: None,
        kind: "heartbeat".into(),
        interval: None,
        grace: None,
        threshold: None,
        cooldown: None,
        monitor: None,
    }
}

fn request(checks: Vec<CheckDefinition>) -> RegisterRequest {
    RegisterRequest {
        project_id: Some("proj".into()),
        display_name: Some("My Project".into()),
        checks,
    }
}

#[tokio::test]
async fn first_registration_creates_project_and_checks_with_defaults() {
    let (store, _, register, _) = setup(1_000);

    let ack = register
        .execute(TOKEN, request(vec![minimal_check("db"), minimal_check("web")]))
        .await
        .expect("register");
    assert_eq!(ack.project_id, "proj");
    assert_eq!(ack.checks_registered, 2);

    let project = store.get_project("proj").await.unwrap().unwrap();
    assert_eq!(project.token, TOKEN);
    assert_eq!(project.display_name, "My Project");
    assert_eq!(project.created_at, 1_000);
    assert_eq!(project.maintenance_until, 0);

    let check = store.get_check("proj:db").await.unwrap().unwrap();
    assert_eq!(check.kind, CheckKind::Heartbeat);
    assert_eq!(check.interval, 300);
    assert_eq!(check.grace, 60);
    assert_eq!(check.threshold, 1);
    assert_eq!(check.cooldown, 900);
    assert!(check.monitor);
    assert_eq!(check.status, CheckStatus::Ok);
    assert_eq!(check.last_seen, 0);
    assert_eq!(check.failure_count, 0);
    assert_eq!(check.last_alert_at, 0);
    assert_eq!(check.last_message, None);
}

#[tokio::test]
async fn repeated_registration_is_idempotent() {
    let (store, _, register, _) = setup(0);

    register.execute(TOKEN, request(vec![minimal_check("db")])).await.unwrap();
    let first = store.get_check("proj:db").await.unwrap().unwrap();

    register.execute(TOKEN, request(vec![minimal_check("db")])).await.unwrap();
    let second = store.get_check("proj:db").await.unwrap().unwrap();

    assert_eq!(first.interval, second.interval);
    assert_eq!(first.grace, second.grace);
    assert_eq!(first.threshold, second.threshold);
    assert_eq!(first.cooldown, second.cooldown);
    assert_eq!(first.status, second.status);
    assert_eq!(first.last_seen, second.last_seen);
    assert_eq!(first.failure_count, second.failure_count);
    assert_eq!(first.created_at, second.created_at);
}

#[tokio::test]
async fn token_mismatch_is_forbidden() {
    let (_, _, register, _) = setup(0);
    register.execute(TOKEN, request(vec![minimal_check("db")])).await.unwrap();

    let err = register
        .execute("other-token", request(vec![minimal_check("db")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SentinelError::Forbidden(_)));
}

#[tokio::test]
async fn invalid_definitions_are_rejected() {
    let (_, _, register, _) = setup(0);

    let mut bad_kind = minimal_check("db");
    bad_kind.kind = "cron".into();
    let err = register.execute(TOKEN, request(vec![bad_kind])).await.unwrap_err();
    assert!(matches!(err, SentinelError::InvalidRequest(_)));

    let mut zero_threshold = minimal_check("db");
    zero_threshold.threshold = Some(0);
    let err = register.execute(TOKEN, request(vec![zero_threshold])).await.unwrap_err();
    assert!(matches!(err, SentinelError::InvalidRequest(_)));

    let mut empty_name = minimal_check("");
    empty_name.name = "  ".into();
    let err = register.execute(TOKEN, request(vec![empty_name])).await.unwrap_err();
    assert!(matches!(err, SentinelError::InvalidRequest(_)));
}

#[tokio::test]
async fn rule_update_preserves_state_attributes() {
    let (store, clock, register, ingest) = setup(0);
    register.execute(TOKEN, request(vec![minimal_check("db")])).await.unwrap();

    // Drive the check into a failing state.
    clock.set(50);
    ingest
        .execute(
            TOKEN,
            PulseRequest {
                project_id: Some("proj".into()),
                check_name: "db".into(),
                status: Some("error".into()),
                message: Some("disk full".into()),
                latency: None,
            },
        )
        .await
        .unwrap();

    // Re-register with tighter rules.
    let mut updated = minimal_check("db");
    updated.interval = Some(30);
    updated.threshold = Some(5);
    updated.display_name = Some("Database".into());
    register.execute(TOKEN, request(vec![updated])).await.unwrap();

    let row = store.get_check("proj:db").await.unwrap().unwrap();
    assert_eq!(row.interval, 30);
    assert_eq!(row.threshold, 5);
    assert_eq!(row.display_name, "Database");
    // State survived the rule update.
    assert_eq!(row.status, CheckStatus::Error);
    assert_eq!(row.failure_count, 1);
    assert_eq!(row.last_seen, 50);
    assert_eq!(row.last_message.as_deref(), Some("disk full"));
}

#[tokio::test]
async fn registration_without_project_id_resolves_by_token() {
    let (store, _, register, _) = setup(0);
    register.execute(TOKEN, request(vec![minimal_check("db")])).await.unwrap();

    // SDK-style body: only checks, project resolved by token.
    let ack = register
        .execute(
            TOKEN,
            RegisterRequest {
                project_id: None,
                display_name: None,
                checks: vec![minimal_check("queue")],
            },
        )
        .await
        .expect("token-resolved registration");
    assert_eq!(ack.project_id, "proj");
    assert!(store.get_check("proj:queue").await.unwrap().is_some());

    // Unknown token cannot create a project implicitly.
    let err = register
        .execute(
            "unknown-token",
            RegisterRequest { project_id: None, display_name: None, checks: vec![] },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SentinelError::Unauthorized));
}

#[tokio::test]
async fn display_name_defaults_to_project_id() {
    let (store, _, register, _) = setup(0);
    register
        .execute(
            TOKEN,
            RegisterRequest { project_id: Some("proj".into()), display_name: None, checks: vec![] },
        )
        .await
        .unwrap();
    let project = store.get_project("proj").await.unwrap().unwrap();
    assert_eq!(project.display_name, "proj");
}
