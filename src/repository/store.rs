// src/repository/store.rs
//! Persistence boundary for projects, checks, logs and settings.
//!
//! Features:
//! - Row-level reads and upserts for projects and checks.
//! - Conditional check updates guarded by an unchanged-version predicate;
//!   the caller re-reads and re-runs its transition on conflict.
//! - Append-only event log with bulk pruning.
//! - Key/value settings rows consumed by the settings provider.
//! - In-memory implementation (fast, concurrency-safe) suitable for tests
//!   and single-node deployments; the relational layout is the documented
//!   migration target.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::model::{Check, CheckKind, LogRecord, Project};

/// A settings row as stored: raw string value plus last-write timestamp.
#[derive(Debug, Clone)]
pub struct SettingRow {
    pub value: String,
    pub updated_at: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_project(&self, id: &str) -> anyhow::Result<Option<Project>>;
    /// Unique lookup used when a pulse omits `project_id`.
    async fn find_project_by_token(&self, token: &str) -> anyhow::Result<Option<Project>>;
    async fn upsert_project(&self, project: Project) -> anyhow::Result<()>;
    async fn list_projects(&self) -> anyhow::Result<Vec<Project>>;

    async fn get_check(&self, check_id: &str) -> anyhow::Result<Option<Check>>;
    /// Inserts a brand-new row at version 0. Fails if the id already exists.
    async fn insert_check(&self, check: Check) -> anyhow::Result<()>;
    /// Writes `check` only if the stored row is still at `expected_version`,
    /// bumping the version on success. Returns false when the row changed
    /// underneath the caller (or disappeared).
    async fn update_check(&self, check: Check, expected_version: u64) -> anyhow::Result<bool>;
    async fn list_checks(&self, project_id: &str) -> anyhow::Result<Vec<Check>>;
    /// Checks the sweeper must consider: `monitor = true` and heartbeat kind.
    /// The deadline comparison stays with the sweeper since it needs `now`.
    async fn list_sweep_candidates(&self) -> anyhow::Result<Vec<Check>>;

    async fn append_log(&self, record: LogRecord) -> anyhow::Result<()>;
    /// Most recent log rows for one check, newest first.
    async fn recent_logs(&self, check_id: &str, limit: usize) -> anyhow::Result<Vec<LogRecord>>;
    /// Deletes log rows strictly older than `cutoff`; returns how many went.
    async fn prune_logs(&self, cutoff: i64) -> anyhow::Result<u64>;

    async fn get_setting(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn put_setting(&self, key: &str, value: &str, now: i64) -> anyhow::Result<()>;
}

/// In-memory implementation over RwLock-guarded maps.
pub struct InMemoryStore {
    projects: Arc<RwLock<HashMap<String, Project>>>,
    checks: Arc<RwLock<HashMap<String, Check>>>,
    logs: Arc<RwLock<Vec<LogRecord>>>,
    settings: Arc<RwLock<HashMap<String, SettingRow>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            projects: Arc::new(RwLock::new(HashMap::new())),
            checks: Arc::new(RwLock::new(HashMap::new())),
            logs: Arc::new(RwLock::new(Vec::new())),
            settings: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_project(&self, id: &str) -> anyhow::Result<Option<Project>> {
        Ok(self.projects.read().await.get(id).cloned())
    }

    async fn find_project_by_token(&self, token: &str) -> anyhow::Result<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.values().find(|p| p.token == token).cloned())
    }

    async fn upsert_project(&self, project: Project) -> anyhow::Result<()> {
        self.projects.write().await.insert(project.id.clone(), project);
        Ok(())
    }

    async fn list_projects(&self) -> anyhow::Result<Vec<Project>> {
        let mut out: Vec<Project> = self.projects.read().await.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn get_check(&self, check_id: &str) -> anyhow::Result<Option<Check>> {
        Ok(self.checks.read().await.get(check_id).cloned())
    }

    async fn insert_check(&self, check: Check) -> anyhow::Result<()> {
        let mut checks = self.checks.write().await;
        if checks.contains_key(&check.id) {
            anyhow::bail!("check '{}' already exists", check.id);
        }
        checks.insert(check.id.clone(), check);
        Ok(())
    }

    async fn update_check(&self, mut check: Check, expected_version: u64) -> anyhow::Result<bool> {
        let mut checks = self.checks.write().await;
        match checks.get(&check.id) {
            Some(current) if current.version == expected_version => {
                check.version = expected_version + 1;
                checks.insert(check.id.clone(), check);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_checks(&self, project_id: &str) -> anyhow::Result<Vec<Check>> {
        let checks = self.checks.read().await;
        let mut out: Vec<Check> = checks
            .values()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn list_sweep_candidates(&self) -> anyhow::Result<Vec<Check>> {
        let checks = self.checks.read().await;
        let mut out: Vec<Check> = checks
            .values()
            .filter(|c| c.monitor && c.kind == CheckKind::Heartbeat)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn append_log(&self, record: LogRecord) -> anyhow::Result<()> {
        self.logs.write().await.push(record);
        Ok(())
    }

    async fn recent_logs(&self, check_id: &str, limit: usize) -> anyhow::Result<Vec<LogRecord>> {
        let logs = self.logs.read().await;
        let mut out: Vec<LogRecord> = logs
            .iter()
            .filter(|l| l.check_id == check_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit);
        Ok(out)
    }

    async fn prune_logs(&self, cutoff: i64) -> anyhow::Result<u64> {
        let mut logs = self.logs.write().await;
        let before = logs.len();
        logs.retain(|l| l.created_at >= cutoff);
        Ok((before - logs.len()) as u64)
    }

    async fn get_setting(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.settings.read().await.get(key).map(|row| row.value.clone()))
    }

    async fn put_setting(&self, key: &str, value: &str, now: i64) -> anyhow::Result<()> {
        self.settings.write().await.insert(
            key.to_string(),
            SettingRow { value: value.to_string(), updated_at: now },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CheckKind;

    #[tokio::test]
    async fn conditional_update_detects_stale_version() {
        let store = InMemoryStore::new();
        let check = Check::new("p", "c", CheckKind::Heartbeat, 0).unwrap();
        store.insert_check(check.clone()).await.unwrap();

        let mut first = store.get_check("p:c").await.unwrap().unwrap();
        first.failure_count = 1;
        assert!(store.update_check(first, 0).await.unwrap());

        // A writer still holding version 0 must lose.
        let mut stale = check.clone();
        stale.failure_count = 7;
        assert!(!store.update_check(stale, 0).await.unwrap());

        let current = store.get_check("p:c").await.unwrap().unwrap();
        assert_eq!(current.failure_count, 1);
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        let check = Check::new("p", "c", CheckKind::Event, 0).unwrap();
        store.insert_check(check.clone()).await.unwrap();
        assert!(store.insert_check(check).await.is_err());
    }

    #[tokio::test]
    async fn prune_removes_only_old_rows() {
        let store = InMemoryStore::new();
        store
            .append_log(LogRecord::new("p:c", "ok", 0, None, 100))
            .await
            .unwrap();
        store
            .append_log(LogRecord::new("p:c", "ok", 0, None, 900))
            .await
            .unwrap();

        let pruned = store.prune_logs(500).await.unwrap();
        assert_eq!(pruned, 1);
        let remaining = store.recent_logs("p:c", 10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].created_at, 900);
    }

    #[tokio::test]
    async fn sweep_candidates_exclude_event_and_unmonitored() {
        let store = InMemoryStore::new();
        let hb = Check::new("p", "hb", CheckKind::Heartbeat, 0).unwrap();
        let ev = Check::new("p", "ev", CheckKind::Event, 0).unwrap();
        let mut off = Check::new("p", "off", CheckKind::Heartbeat, 0).unwrap();
        off.monitor = false;
        store.insert_check(hb).await.unwrap();
        store.insert_check(ev).await.unwrap();
        store.insert_check(off).await.unwrap();

        let candidates = store.list_sweep_candidates().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "p:hb");
    }
}
