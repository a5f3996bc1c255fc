//! The 15-second tick loop that fires due jobs against a [`TriggerHandler`].

use std::sync::Arc;

use async_trait::async_trait;
use automate_models::{Job, JobKind, Schedule};
use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::job_store::JobStore;

/// Tick period for the scheduler loop.
pub const TICK_INTERVAL: Duration = Duration::from_secs(15);

/// Dispatches a fired job to whatever owns the agent it belongs to. The
/// scheduler never reaches back into a global registry to find one — it's
/// handed one handler at construction.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn on_fire(&self, job: &Job);
}

pub struct Scheduler {
    store: Arc<JobStore>,
    handler: Arc<dyn TriggerHandler>,
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl Scheduler {
    pub fn new(store: Arc<JobStore>, handler: Arc<dyn TriggerHandler>) -> Self {
        Scheduler {
            store,
            handler,
            shutdown_tx: Mutex::new(None),
        }
    }

    pub async fn load(&self) -> Result<()> {
        self.store.load().await
    }

    pub async fn add_job(
        &self,
        name: impl Into<String>,
        kind: JobKind,
        schedule: Schedule,
        session_id: Option<String>,
    ) -> Result<Job> {
        self.store.add_job(name, kind, schedule, session_id).await
    }

    pub async fn remove_job(&self, id: &str) -> Result<bool> {
        self.store.remove_job(id).await
    }

    pub async fn enable_job(&self, id: &str) -> Result<bool> {
        self.store.enable_job(id).await
    }

    pub async fn disable_job(&self, id: &str) -> Result<bool> {
        self.store.disable_job(id).await
    }

    pub async fn list_jobs(&self) -> Vec<Job> {
        self.store.list_jobs().await
    }

    pub async fn get_job(&self, id: &str) -> Option<Job> {
        self.store.get_job(id).await
    }

    pub async fn find_by_name(&self, name: &str) -> Option<Job> {
        self.store.find_by_name(name).await
    }

    /// Run one sweep: fire every due job and invoke the handler for each, in
    /// insertion order. A handler failure is logged and never retried or
    /// propagated.
    pub async fn tick(&self) {
        let fired = match self.store.fire_due(Utc::now()).await {
            Ok(fired) => fired,
            Err(e) => {
                warn!(error = %e, "scheduler tick failed to sweep due jobs");
                return;
            }
        };

        for job in fired {
            self.handler.on_fire(&job).await;
        }
    }

    /// Start the tick loop as a background task. Idempotent: calling
    /// `start` while already running restarts the loop.
    pub fn start(self: &Arc<Self>) {
        let (tx, mut rx) = watch::channel(false);
        let scheduler = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        scheduler.tick().await;
                    }
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            debug!("scheduler tick loop shutting down");
                            break;
                        }
                    }
                }
            }
        });

        if let Ok(mut guard) = self.shutdown_tx.try_lock() {
            *guard = Some(tx);
        }
    }

    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use automate_models::JobKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TriggerHandler for CountingHandler {
        async fn on_fire(&self, _job: &Job) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn tick_fires_due_once_job_exactly_once() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new(dir.path()));
        let count = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(store, Arc::new(CountingHandler { count: count.clone() }));

        scheduler
            .add_job(
                "once",
                JobKind::Prompt { text: "hi".into() },
                Schedule::Once { at: Utc::now() - chrono::Duration::seconds(1) },
                None,
            )
            .await
            .unwrap();

        scheduler.tick().await;
        scheduler.tick().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tick_is_a_noop_with_no_due_jobs() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new(dir.path()));
        let count = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(store, Arc::new(CountingHandler { count: count.clone() }));
        scheduler.tick().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn firing_order_follows_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new(dir.path()));

        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        struct RecordingHandler {
            order: Arc<tokio::sync::Mutex<Vec<String>>>,
        }
        #[async_trait]
        impl TriggerHandler for RecordingHandler {
            async fn on_fire(&self, job: &Job) {
                self.order.lock().await.push(job.name.clone());
            }
        }

        let scheduler = Scheduler::new(store, Arc::new(RecordingHandler { order: order.clone() }));
        let past = Utc::now() - chrono::Duration::seconds(1);
        for name in ["first", "second", "third"] {
            scheduler
                .add_job(name, JobKind::Prompt { text: "hi".into() }, Schedule::Once { at: past }, None)
                .await
                .unwrap();
        }

        scheduler.tick().await;
        assert_eq!(*order.lock().await, vec!["first", "second", "third"]);
    }
}
