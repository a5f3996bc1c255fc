//! Polls skill directories for changes and reloads the loader in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::error::Result;
use crate::loader::SkillLoader;

const POLL_INTERVAL: Duration = Duration::from_secs(10);

fn epoch_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Wraps a [`SkillLoader`] with a background mtime-poll loop that reloads
/// whenever any tracked `SKILL.md` changes.
pub struct SkillWatcher {
    loader: Arc<SkillLoader>,
    last_seen_mtime: AtomicU64,
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl SkillWatcher {
    pub fn new(loader: Arc<SkillLoader>) -> Self {
        SkillWatcher { loader, last_seen_mtime: AtomicU64::new(0), shutdown_tx: Mutex::new(None) }
    }

    /// Reload if any tracked `SKILL.md`'s mtime advanced since the last
    /// check. Returns whether a reload happened.
    pub async fn reload_if_changed(&self) -> Result<bool> {
        let latest = epoch_secs(self.loader.latest_mtime());
        let previous = self.last_seen_mtime.load(Ordering::SeqCst);
        if latest <= previous {
            return Ok(false);
        }
        self.loader.load_all().await?;
        self.last_seen_mtime.store(latest, Ordering::SeqCst);
        Ok(true)
    }

    /// Start the background poll loop. Idempotent: calling again replaces
    /// the previous loop's shutdown handle, stopping it.
    pub async fn start_watching(self: &Arc<Self>) {
        self.last_seen_mtime.store(epoch_secs(self.loader.latest_mtime()), Ordering::SeqCst);

        let (tx, mut rx) = watch::channel(false);
        let watcher = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = watcher.reload_if_changed().await {
                            warn!(error = %e, "skill watcher reload failed");
                        }
                    }
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            debug!("skill watcher shutting down");
                            break;
                        }
                    }
                }
            }
        });

        *self.shutdown_tx.lock().await = Some(tx);
    }

    pub async fn stop_watching(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn reload_if_changed_is_false_when_nothing_changed() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("a/SKILL.md"), "# A\n\nBody.\n");

        let loader = Arc::new(SkillLoader::new(dir.path(), vec![]));
        loader.load_all().await.unwrap();
        let watcher = Arc::new(SkillWatcher::new(loader));
        watcher.last_seen_mtime.store(epoch_secs(watcher.loader.latest_mtime()), Ordering::SeqCst);

        assert!(!watcher.reload_if_changed().await.unwrap());
    }

    #[tokio::test]
    async fn reload_if_changed_detects_new_skill() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("a/SKILL.md"), "# A\n\nBody.\n");

        let loader = Arc::new(SkillLoader::new(dir.path(), vec![]));
        loader.load_all().await.unwrap();
        let watcher = Arc::new(SkillWatcher::new(loader.clone()));
        watcher.last_seen_mtime.store(epoch_secs(loader.latest_mtime()), Ordering::SeqCst);

        // simulate a later edit by forcing the tracked mtime backwards
        watcher.last_seen_mtime.store(0, Ordering::SeqCst);
        assert!(watcher.reload_if_changed().await.unwrap());
    }
}
