//! Persistent job list: add/remove/enable/disable plus the due-job sweep
//! the tick loop drives.

use std::path::{Path, PathBuf};

use automate_models::{Job, JobKind, Schedule};
use automate_persistence::{atomic_write_json, read_json_tolerant, DropCounter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::cron::CronSchedule;
use crate::error::{Result, SchedulerError};

#[derive(Debug, Serialize, Deserialize, Default)]
struct JobsFile {
    jobs: Vec<Job>,
}

pub struct JobStore {
    path: PathBuf,
    jobs: Mutex<Vec<Job>>,
    drop_counter: DropCounter,
}

impl JobStore {
    pub fn new(cron_dir: impl AsRef<Path>) -> Self {
        JobStore {
            path: cron_dir.as_ref().join("jobs.json"),
            jobs: Mutex::new(Vec::new()),
            drop_counter: DropCounter::new(),
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.drop_counter.total()
    }

    /// Load the persisted jobs list. A corrupt file is treated as empty.
    pub async fn load(&self) -> Result<()> {
        match read_json_tolerant::<JobsFile>(&self.path) {
            Some(file) => *self.jobs.lock().await = file.jobs,
            None if self.path.exists() => {
                self.drop_counter.record(&self.path, "corrupt jobs.json");
            }
            None => {}
        }
        Ok(())
    }

    fn persist(&self, jobs: &[Job]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        atomic_write_json(&self.path, &JobsFile { jobs: jobs.to_vec() })?;
        Ok(())
    }

    pub async fn add_job(
        &self,
        name: impl Into<String>,
        kind: JobKind,
        schedule: Schedule,
        session_id: Option<String>,
    ) -> Result<Job> {
        if let Schedule::Interval { every_ms } = &schedule {
            if *every_ms <= 0 {
                return Err(SchedulerError::Validation("interval schedule must have every_ms > 0".into()));
            }
        }

        let mut job = Job::new(name, kind, schedule);
        if let Some(session_id) = session_id {
            job = job.with_session(session_id);
        }
        job.next_run = initial_next_run(&job.schedule);

        let mut jobs = self.jobs.lock().await;
        jobs.push(job.clone());
        self.persist(&jobs)?;
        Ok(job)
    }

    pub async fn remove_job(&self, id: &str) -> Result<bool> {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        let removed = jobs.len() != before;
        if removed {
            self.persist(&jobs)?;
        }
        Ok(removed)
    }

    pub async fn enable_job(&self, id: &str) -> Result<bool> {
        self.set_enabled(id, true).await
    }

    pub async fn disable_job(&self, id: &str) -> Result<bool> {
        self.set_enabled(id, false).await
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool> {
        let mut jobs = self.jobs.lock().await;
        let Some(job) = jobs.iter_mut().find(|j| j.id == id) else { return Ok(false) };
        job.enabled = enabled;
        if enabled && job.next_run.is_none() && !job.is_once() {
            job.next_run = compute_next_run(&job.schedule, Utc::now());
        }
        self.persist(&jobs)?;
        Ok(true)
    }

    pub async fn list_jobs(&self) -> Vec<Job> {
        self.jobs.lock().await.clone()
    }

    pub async fn get_job(&self, id: &str) -> Option<Job> {
        self.jobs.lock().await.iter().find(|j| j.id == id).cloned()
    }

    pub async fn find_by_name(&self, name: &str) -> Option<Job> {
        self.jobs.lock().await.iter().find(|j| j.name == name).cloned()
    }

    /// Advance every due, enabled job and return clones of the ones that
    /// fired, in insertion order. Holds the jobs lock for the whole sweep so
    /// add/remove/enable/disable are mutually exclusive with tick
    /// processing.
    pub async fn fire_due(&self, now: DateTime<Utc>) -> Result<Vec<Job>> {
        let mut jobs = self.jobs.lock().await;
        let mut fired = Vec::new();

        for job in jobs.iter_mut() {
            if !job.enabled {
                continue;
            }
            let Some(next_run) = job.next_run else { continue };
            if next_run > now {
                continue;
            }

            job.last_run = Some(now);
            job.run_count += 1;
            if job.is_once() {
                job.enabled = false;
                job.next_run = None;
            } else {
                job.next_run = compute_next_run(&job.schedule, now);
            }
            fired.push(job.clone());
        }

        if !fired.is_empty() {
            self.persist(&jobs)?;
        }
        Ok(fired)
    }
}

/// `next_run` at creation time. Cron parse failures yield `None` rather than
/// rejecting the job — the job is still persisted with an undefined
/// `next_run`.
fn initial_next_run(schedule: &Schedule) -> Option<DateTime<Utc>> {
    match schedule {
        Schedule::Once { at } => Some(*at),
        Schedule::Interval { every_ms } => Some(Utc::now() + chrono::Duration::milliseconds(*every_ms)),
        Schedule::Cron { expression } => match CronSchedule::parse(expression) {
            Ok(cron) => Some(cron.next_after(Utc::now())),
            Err(e) => {
                warn!(expression = %expression, error = %e, "invalid cron expression, job created without a next run");
                None
            }
        },
    }
}

/// `next_run` recomputed from `now` after a fire (or on re-enable).
fn compute_next_run(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match schedule {
        Schedule::Once { at } => Some(*at),
        Schedule::Interval { every_ms } => Some(now + chrono::Duration::milliseconds(*every_ms)),
        Schedule::Cron { expression } => CronSchedule::parse(expression).ok().map(|c| c.next_after(now)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use automate_models::JobKind;
    use tempfile::TempDir;

    fn prompt_job() -> JobKind {
        JobKind::Prompt { text: "hi".into() }
    }

    #[tokio::test]
    async fn add_job_computes_next_run_for_interval() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new(dir.path());
        let job = store
            .add_job("demo", prompt_job(), Schedule::Interval { every_ms: 1000 }, None)
            .await
            .unwrap();
        assert!(job.next_run.is_some());
    }

    #[tokio::test]
    async fn add_job_rejects_non_positive_interval() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new(dir.path());
        let result = store.add_job("demo", prompt_job(), Schedule::Interval { every_ms: 0 }, None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn invalid_cron_job_is_still_persisted_without_next_run() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new(dir.path());
        let job = store
            .add_job("demo", prompt_job(), Schedule::Cron { expression: "not a cron".into() }, None)
            .await
            .unwrap();
        assert!(job.next_run.is_none());
        assert_eq!(store.list_jobs().await.len(), 1);
    }

    #[tokio::test]
    async fn remove_job_drops_it() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new(dir.path());
        let job = store.add_job("demo", prompt_job(), Schedule::Interval { every_ms: 1000 }, None).await.unwrap();
        assert!(store.remove_job(&job.id).await.unwrap());
        assert!(store.get_job(&job.id).await.is_none());
    }

    #[tokio::test]
    async fn once_job_past_due_fires_and_disables() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new(dir.path());
        let job = store
            .add_job("once", prompt_job(), Schedule::Once { at: Utc::now() - chrono::Duration::seconds(1) }, None)
            .await
            .unwrap();

        let fired = store.fire_due(Utc::now()).await.unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, job.id);

        let reloaded = store.get_job(&job.id).await.unwrap();
        assert!(!reloaded.enabled);
        assert!(reloaded.next_run.is_none());
        assert_eq!(reloaded.run_count, 1);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let id;
        {
            let store = JobStore::new(dir.path());
            let job = store.add_job("demo", prompt_job(), Schedule::Interval { every_ms: 5000 }, None).await.unwrap();
            id = job.id;
        }

        let reloaded = JobStore::new(dir.path());
        reloaded.load().await.unwrap();
        assert!(reloaded.get_job(&id).await.is_some());
    }

    #[tokio::test]
    async fn disabled_job_never_fires() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new(dir.path());
        let job = store
            .add_job("once", prompt_job(), Schedule::Once { at: Utc::now() - chrono::Duration::seconds(1) }, None)
            .await
            .unwrap();
        store.disable_job(&job.id).await.unwrap();
        let fired = store.fire_due(Utc::now()).await.unwrap();
        assert!(fired.is_empty());
    }
}
