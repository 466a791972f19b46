// src/domain/transition.rs
//! Alert state machine.
//!
//! - Pure function of (check row, project row, event, policy, now); no I/O,
//!   no clock reads, deterministic for a given input.
//! - The threshold comparison is inclusive: the threshold-th consecutive
//!   failure triggers.
//! - `last_alert_at == 0` means "never alerted" and always satisfies the
//!   cooldown predicate; the predicate itself is inclusive
//!   (`now - last_alert_at >= cooldown`).
//! - Maintenance suppresses failure alerts only. It does not reset
//!   `failure_count`, and recovery alerts still go out during a window.
//! - A synthetic dead event never advances `last_seen`.
//!
//! Row versioning is the store's concern; this function returns the next row
//! content and the caller commits it under the optimistic-update discipline.

use crate::domain::model::alert::{AlertLevel, AlertRecord};
use crate::domain::model::check::{Check, CheckStatus};
use crate::domain::model::event::PulseEvent;
use crate::domain::model::project::Project;

/// Global notification policy resolved by the settings provider. The
/// per-check `cooldown` wins over `silence_period` when it is set.
#[derive(Debug, Clone, Copy)]
pub struct AlertPolicy {
    pub silence_period: i64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self { silence_period: 3600 }
    }
}

fn cooldown_elapsed(check: &Check, policy: &AlertPolicy, now: i64) -> bool {
    check.last_alert_at == 0
        || now - check.last_alert_at >= check.effective_cooldown(policy.silence_period)
}

/// Single transition step: consumes one event and yields the next row state
/// plus at most one alert.
pub fn transition(
    check: &Check,
    project: &Project,
    event: &PulseEvent,
    policy: &AlertPolicy,
    now: i64,
) -> (Check, Option<AlertRecord>) {
    let mut next = check.clone();

    match event {
        PulseEvent::Ok { message, .. } => {
            // Only issue a recovery if a prior alert was actually sent for
            // this incident (failure_count reached the threshold).
            let recovering =
                check.status != CheckStatus::Ok && check.failure_count >= check.threshold;
            let alert = if recovering {
                next.last_alert_at = now;
                Some(AlertRecord::for_check(
                    AlertLevel::Recovery,
                    format!("{} recovered", check.display_name),
                    message
                        .clone()
                        .unwrap_or_else(|| "pulse received; back to normal".into()),
                    check,
                    project,
                    now,
                ))
            } else {
                None
            };
            next.failure_count = 0;
            next.status = CheckStatus::Ok;
            next.last_seen = now.max(check.last_seen);
            next.last_message = message.clone();
            (next, alert)
        }

        PulseEvent::Error { message, .. } => {
            next.failure_count = check.failure_count.saturating_add(1);
            next.status = CheckStatus::Error;
            next.last_seen = now.max(check.last_seen);
            next.last_message = message.clone();

            let alert = if !project.in_maintenance(now)
                && next.failure_count >= check.threshold
                && cooldown_elapsed(check, policy, now)
            {
                next.last_alert_at = now;
                Some(AlertRecord::for_check(
                    AlertLevel::Warning,
                    format!("{} failing", check.display_name),
                    message.clone().unwrap_or_else(|| "error reported".into()),
                    &next,
                    project,
                    now,
                ))
            } else {
                None
            };
            (next, alert)
        }

        PulseEvent::Dead { elapsed } => {
            let missed = format!("heartbeat missed; last seen {}s ago", elapsed);
            next.failure_count = check.failure_count.saturating_add(1);
            next.status = CheckStatus::Dead;
            // last_seen stays put: no pulse arrived.
            next.last_message = Some(missed.clone());

            let alert = if !project.in_maintenance(now)
                && next.failure_count >= check.threshold
                && cooldown_elapsed(check, policy, now)
            {
                next.last_alert_at = now;
                Some(AlertRecord::for_check(
                    AlertLevel::Critical,
                    format!("{} is down", check.display_name),
                    missed,
                    &next,
                    project,
                    now,
                ))
            } else {
                None
            };
            (next, alert)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::check::CheckKind;

    fn project() -> Project {
        Project::new("proj", "secret-token-0123", "Proyecto", 0)
    }

    fn check(threshold: u32, cooldown: i64) -> Check {
        let mut c = Check::new("proj", "db", CheckKind::Heartbeat, 0).unwrap();
        c.interval = 60;
        c.grace = 10;
        c.threshold = threshold;
        c.cooldown = cooldown;
        c
    }

    fn err() -> PulseEvent {
        PulseEvent::Error { message: Some("boom".into()), latency: None }
    }

    fn ok() -> PulseEvent {
        PulseEvent::Ok { message: Some("fine".into()), latency: Some(12) }
    }

    #[test]
    fn flapping_below_threshold_stays_silent() {
        let p = project();
        let policy = AlertPolicy::default();
        let mut c = check(3, 600);

        let (c1, a1) = transition(&c, &p, &err(), &policy, 10);
        assert!(a1.is_none());
        c = c1;
        let (c2, a2) = transition(&c, &p, &err(), &policy, 20);
        assert!(a2.is_none());
        c = c2;
        let (c3, a3) = transition(&c, &p, &ok(), &policy, 30);
        assert!(a3.is_none(), "below threshold: no recovery either");
        assert_eq!(c3.status, CheckStatus::Ok);
        assert_eq!(c3.failure_count, 0);
        assert_eq!(c3.last_seen, 30);
    }

    #[test]
    fn threshold_met_then_cooldown_then_realert() {
        let p = project();
        let policy = AlertPolicy::default();
        let mut c = check(2, 600);

        let (c1, a1) = transition(&c, &p, &err(), &policy, 0);
        assert!(a1.is_none());
        c = c1;

        let (c2, a2) = transition(&c, &p, &err(), &policy, 5);
        let alert = a2.expect("second consecutive failure alerts");
        assert_eq!(alert.level, AlertLevel::Warning);
        assert_eq!(c2.last_alert_at, 5);
        c = c2;

        let (c3, a3) = transition(&c, &p, &err(), &policy, 10);
        assert!(a3.is_none(), "inside cooldown");
        assert_eq!(c3.last_alert_at, 5);
        c = c3;

        let (c4, a4) = transition(&c, &p, &err(), &policy, 700);
        assert!(a4.is_some(), "cooldown elapsed");
        assert_eq!(c4.last_alert_at, 700);
    }

    #[test]
    fn dead_then_recovery() {
        let p = project();
        let policy = AlertPolicy::default();
        let mut c = check(1, 300);
        c.last_seen = 0;

        let (c1, a1) = transition(&c, &p, &PulseEvent::Dead { elapsed: 100 }, &policy, 100);
        let alert = a1.expect("first dead event alerts at threshold 1");
        assert_eq!(alert.level, AlertLevel::Critical);
        assert_eq!(c1.status, CheckStatus::Dead);
        assert_eq!(c1.failure_count, 1);
        assert_eq!(c1.last_alert_at, 100);
        assert_eq!(c1.last_seen, 0, "dead never advances last_seen");
        c = c1;

        let (c2, a2) = transition(&c, &p, &ok(), &policy, 200);
        let rec = a2.expect("pulse after dead recovers");
        assert_eq!(rec.level, AlertLevel::Recovery);
        assert_eq!(c2.status, CheckStatus::Ok);
        assert_eq!(c2.failure_count, 0);
        assert_eq!(c2.last_seen, 200);
        assert_eq!(c2.last_alert_at, 200, "recovery stamps last_alert_at");
    }

    #[test]
    fn maintenance_suppresses_but_does_not_reset() {
        let mut p = project();
        p.maintenance_until = 500;
        let policy = AlertPolicy::default();
        let mut c = check(1, 600);

        let (c1, a1) = transition(&c, &p, &err(), &policy, 100);
        assert!(a1.is_none(), "inside the window");
        assert_eq!(c1.failure_count, 1);
        assert_eq!(c1.status, CheckStatus::Error);
        assert_eq!(c1.last_alert_at, 0);
        c = c1;

        // A further failure after the window ends does alert.
        let (c2, a2) = transition(&c, &p, &err(), &policy, 600);
        assert!(a2.is_some());
        assert_eq!(c2.last_alert_at, 600);
    }

    #[test]
    fn recovery_still_emitted_during_maintenance() {
        let mut p = project();
        p.maintenance_until = 1_000;
        let policy = AlertPolicy::default();
        let mut c = check(1, 600);
        c.status = CheckStatus::Error;
        c.failure_count = 2;

        let (c1, a1) = transition(&c, &p, &ok(), &policy, 500);
        assert!(a1.is_some(), "maintenance gates failure alerts only");
        assert_eq!(a1.unwrap().level, AlertLevel::Recovery);
        assert_eq!(c1.failure_count, 0);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let p = project();
        let policy = AlertPolicy::default();
        let c = check(3, 600);

        let mut cur = c.clone();
        let (c1, a1) = transition(&cur, &p, &err(), &policy, 1);
        assert!(a1.is_none(), "threshold - 1 does not trigger");
        cur = c1;
        let (c2, a2) = transition(&cur, &p, &err(), &policy, 2);
        assert!(a2.is_none());
        cur = c2;
        let (_, a3) = transition(&cur, &p, &err(), &policy, 3);
        assert!(a3.is_some(), "the threshold-th failure triggers");
    }

    #[test]
    fn cooldown_boundary_is_inclusive() {
        let p = project();
        let policy = AlertPolicy::default();
        let mut c = check(1, 600);
        c.failure_count = 3;
        c.status = CheckStatus::Error;
        c.last_alert_at = 100;

        let (_, early) = transition(&c, &p, &err(), &policy, 699);
        assert!(early.is_none());
        let (_, exact) = transition(&c, &p, &err(), &policy, 700);
        assert!(exact.is_some(), "now - last_alert_at == cooldown satisfies");
    }

    #[test]
    fn never_alerted_always_passes_cooldown() {
        let p = project();
        let policy = AlertPolicy { silence_period: i64::MAX };
        let mut c = check(1, 0);
        c.last_alert_at = 0;

        let (_, alert) = transition(&c, &p, &err(), &policy, 1);
        assert!(alert.is_some());
    }

    #[test]
    fn global_silence_period_used_when_cooldown_unset() {
        let p = project();
        let policy = AlertPolicy { silence_period: 1_000 };
        let mut c = check(1, 0);
        c.status = CheckStatus::Error;
        c.failure_count = 1;
        c.last_alert_at = 50;

        let (_, a1) = transition(&c, &p, &err(), &policy, 900);
        assert!(a1.is_none(), "global period still running");
        let (_, a2) = transition(&c, &p, &err(), &policy, 1_050);
        assert!(a2.is_some());
    }

    #[test]
    fn ok_keeps_last_seen_monotonic() {
        let p = project();
        let policy = AlertPolicy::default();
        let mut c = check(1, 600);
        c.last_seen = 500;

        // A delayed pulse processed with an older `now` must not rewind.
        let (c1, _) = transition(&c, &p, &ok(), &policy, 400);
        assert_eq!(c1.last_seen, 500);
    }

    #[test]
    fn status_ok_iff_zero_failures() {
        let p = project();
        let policy = AlertPolicy::default();
        let mut c = check(2, 600);

        for (ev, now) in [(err(), 1), (err(), 2), (PulseEvent::Dead { elapsed: 10 }, 3), (ok(), 4)] {
            let (next, _) = transition(&c, &p, &ev, &policy, now);
            assert_eq!(next.status == CheckStatus::Ok, next.failure_count == 0);
            c = next;
        }
    }

    #[test]
    fn dead_message_reports_elapsed() {
        let p = project();
        let policy = AlertPolicy::default();
        let c = check(1, 600);

        let (next, alert) = transition(&c, &p, &PulseEvent::Dead { elapsed: 173 }, &policy, 173);
        assert_eq!(
            next.last_message.as_deref(),
            Some("heartbeat missed; last seen 173s ago")
        );
        assert_eq!(alert.unwrap().message, "heartbeat missed; last seen 173s ago");
    }
}
