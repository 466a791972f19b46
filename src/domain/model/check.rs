// src/domain/model/check.rs
//! Check row: rule attributes (set by registration, read-only for the state
//! machine) plus state attributes (mutated only by the state machine).
//!
//! The canonical check id is `"{project_id}:{name}"`; both components must be
//! non-empty so the encoding stays bijective with the pair.

use serde::{Deserialize, Serialize};

use crate::domain::error::SentinelError;

/// Registration defaults applied when a check definition omits the field.
pub const DEFAULT_INTERVAL: i64 = 300;
pub const DEFAULT_GRACE: i64 = 60;
pub const DEFAULT_THRESHOLD: u32 = 1;
pub const DEFAULT_COOLDOWN: i64 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// Expects periodic pulses; overdue pulses become synthetic `dead` events.
    Heartbeat,
    /// Only reports errors; never swept.
    Event,
}

impl CheckKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "heartbeat" => Some(CheckKind::Heartbeat),
            "event" => Some(CheckKind::Event),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Heartbeat => "heartbeat",
            CheckKind::Event => "event",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
    Dead,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Error => "error",
            CheckStatus::Dead => "dead",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    /// Canonical id `"{project_id}:{name}"`.
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub display_name: String,
    pub kind: CheckKind,

    // -- rule attributes ----------------------------------------------------
    /// Expected seconds between pulses (heartbeat only).
    pub interval: i64,
    /// Extra slack before the check is considered overdue.
    pub grace: i64,
    /// Consecutive failures required to alert (inclusive).
    pub threshold: u32,
    /// Per-check override of the global silence period; 0 = use the default.
    pub cooldown: i64,
    /// When false the sweeper skips this check entirely.
    pub monitor: bool,

    // -- state attributes ---------------------------------------------------
    pub status: CheckStatus,
    /// Last received pulse. Never advanced by a synthetic dead event.
    pub last_seen: i64,
    /// Consecutive non-ok events currently observed.
    pub failure_count: u32,
    /// Most recent notification emission; 0 = never alerted.
    pub last_alert_at: i64,
    pub last_message: Option<String>,

    /// Row version for optimistic concurrency; bumped on every state write.
    pub version: u64,
    pub created_at: i64,
}

/// Builds the canonical check id, rejecting empty components.
pub fn check_id(project_id: &str, name: &str) -> Result<String, SentinelError> {
    if project_id.trim().is_empty() || name.trim().is_empty() {
        return Err(SentinelError::InvalidRequest(
            "project id and check name must be non-empty".into(),
        ));
    }
    Ok(format!("{}:{}", project_id, name))
}

impl Check {
    /// New check row with default rules and a clean state.
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        kind: CheckKind,
        now: i64,
    ) -> Result<Self, SentinelError> {
        let project_id = project_id.into();
        let name = name.into();
        let id = check_id(&project_id, &name)?;
        Ok(Self {
            id,
            display_name: name.clone(),
            project_id,
            name,
            kind,
            interval: DEFAULT_INTERVAL,
            grace: DEFAULT_GRACE,
            threshold: DEFAULT_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
            monitor: true,
            status: CheckStatus::Ok,
            last_seen: 0,
            failure_count: 0,
            last_alert_at: 0,
            last_message: None,
            version: 0,
            created_at: now,
        })
    }

    /// Effective cooldown: the per-check value when set, else the global
    /// silence period. Never the sum of both.
    pub fn effective_cooldown(&self, silence_period: i64) -> i64 {
        if self.cooldown > 0 {
            self.cooldown
        } else {
            silence_period
        }
    }

    /// Deadline after which a heartbeat is overdue. Strict comparison: a
    /// check is dead only when `deadline < now`.
    pub fn deadline(&self) -> i64 {
        self.last_seen + self.interval + self.grace
    }
}
