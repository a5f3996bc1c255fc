//! Per-conversation message log with automatic, token-budget-driven
//! compaction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use automate_models::{Message, MessageRole, Session, SessionSummary};
use automate_persistence::{atomic_write_json, read_json_tolerant, DropCounter};
use chrono::{Timelike, Utc};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::Result;

/// Default fraction of `context_limit` at which `AppendMessage` triggers
/// automatic compaction.
pub const DEFAULT_COMPACT_AT: f64 = 0.75;

/// Target fraction of `context_limit` an automatic compaction reduces to.
const AUTO_COMPACT_TARGET_RATIO: f64 = 0.5;

/// Target fraction a manual, instructed compaction reduces to.
const MANUAL_COMPACT_TARGET_RATIO: f64 = 0.33;

/// Non-system messages below this count are never dropped by compaction.
const MIN_TAIL_MESSAGES: usize = 2;

/// Receives a snapshot of a session's messages immediately before a
/// compaction runs. Invoked fire-and-forget: `AppendMessage` never awaits it
/// and a hook failure never blocks or is surfaced to the caller.
#[async_trait]
pub trait BeforeCompactHook: Send + Sync {
    async fn on_before_compact(&self, session_id: &str, messages: Vec<Message>);
}

/// Outcome of a compaction pass.
#[derive(Debug, Clone, Default)]
pub struct CompactionReport {
    pub dropped: usize,
    pub estimated_tokens_after: usize,
}

pub struct SessionStoreConfig {
    pub directory: PathBuf,
    pub context_limit: usize,
    pub compact_at: f64,
    pub auto_reset_hour: Option<u8>,
}

impl SessionStoreConfig {
    pub fn new(directory: impl Into<PathBuf>, context_limit: usize) -> Self {
        SessionStoreConfig {
            directory: directory.into(),
            context_limit,
            compact_at: DEFAULT_COMPACT_AT,
            auto_reset_hour: None,
        }
    }
}

pub struct SessionStore {
    config: SessionStoreConfig,
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    before_compact_hook: RwLock<Option<Arc<dyn BeforeCompactHook>>>,
    drop_counter: DropCounter,
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl SessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        SessionStore {
            config,
            sessions: RwLock::new(HashMap::new()),
            before_compact_hook: RwLock::new(None),
            drop_counter: DropCounter::new(),
            shutdown_tx: Mutex::new(None),
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.drop_counter.total()
    }

    pub async fn set_before_compact_hook(&self, hook: Arc<dyn BeforeCompactHook>) {
        *self.before_compact_hook.write().await = Some(hook);
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.config.directory.join(format!("{session_id}.json"))
    }

    fn load_from_disk(&self, session_id: &str) -> Option<Session> {
        let path = self.session_path(session_id);
        match read_json_tolerant::<Session>(&path) {
            Some(session) => Some(session),
            None if path.exists() => {
                self.drop_counter.record(&path, "corrupt session file");
                None
            }
            None => None,
        }
    }

    pub async fn get_or_create(&self, channel: &str, user_id: &str) -> Arc<Mutex<Session>> {
        let id = Session::make_id(channel, user_id);

        if let Some(existing) = self.sessions.read().await.get(&id) {
            return existing.clone();
        }

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&id) {
            return existing.clone();
        }

        let session = self
            .load_from_disk(&id)
            .unwrap_or_else(|| Session::new(channel, user_id));
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(id, handle.clone());
        handle
    }

    async fn handle_for(&self, session_id: &str) -> Option<Arc<Mutex<Session>>> {
        if let Some(existing) = self.sessions.read().await.get(session_id) {
            return Some(existing.clone());
        }
        let loaded = self.load_from_disk(session_id)?;
        let mut sessions = self.sessions.write().await;
        let handle = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(loaded)))
            .clone();
        Some(handle)
    }

    pub async fn append_message(&self, session_id: &str, message: Message) -> Result<()> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;

        let snapshot_for_hook = {
            let mut session = handle.lock().await;
            session.messages.push(message);
            session.message_count += 1;
            session.updated_at = Utc::now();

            let threshold = self.config.context_limit as f64 * self.config.compact_at;
            let estimated = estimate_tokens(&session.messages);

            if (estimated as f64) > threshold {
                Some(session.messages.clone())
            } else {
                None
            }
        };

        if let Some(messages) = snapshot_for_hook {
            self.fire_before_compact_hook(session_id, messages);
            self.compact_internal(session_id, &handle, AUTO_COMPACT_TARGET_RATIO, None).await?;
        }

        self.save_handle(session_id, &handle).await?;
        Ok(())
    }

    fn fire_before_compact_hook(&self, session_id: &str, messages: Vec<Message>) {
        let hook_slot = &self.before_compact_hook;
        let session_id = session_id.to_string();
        // Read the hook synchronously-ish via try_read to avoid making this
        // async fn await anything the caller would observe as latency; the
        // common case (no contention on this lock) resolves immediately.
        if let Ok(guard) = hook_slot.try_read() {
            if let Some(hook) = guard.clone() {
                tokio::spawn(async move {
                    hook.on_before_compact(&session_id, messages).await;
                });
            }
        }
    }

    pub async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;
        Ok(handle.lock().await.messages.clone())
    }

    pub async fn reset(&self, session_id: &str) -> Result<()> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;
        {
            let mut session = handle.lock().await;
            session.messages.clear();
            session.message_count = 0;
            session.updated_at = Utc::now();
        }
        self.save_handle(session_id, &handle).await
    }

    pub async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        let path = self.session_path(session_id);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    pub async fn compact(&self, session_id: &str) -> Result<CompactionReport> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;
        let report = self.compact_internal(session_id, &handle, AUTO_COMPACT_TARGET_RATIO, None).await?;
        self.save_handle(session_id, &handle).await?;
        Ok(report)
    }

    pub async fn compact_with_instructions(&self, session_id: &str, instructions: &str) -> Result<CompactionReport> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;
        let report = self
            .compact_internal(session_id, &handle, MANUAL_COMPACT_TARGET_RATIO, Some(instructions))
            .await?;
        self.save_handle(session_id, &handle).await?;
        Ok(report)
    }

    async fn compact_internal(
        &self,
        _session_id: &str,
        handle: &Arc<Mutex<Session>>,
        target_ratio: f64,
        instructions: Option<&str>,
    ) -> Result<CompactionReport> {
        let mut session = handle.lock().await;
        let target = self.config.context_limit as f64 * target_ratio;

        let (system_msgs, mut non_system): (Vec<Message>, Vec<Message>) =
            session.messages.drain(..).partition(|m| m.role == MessageRole::System);

        let original_non_system_len = non_system.len();

        while estimate_tokens_ref(&system_msgs, &non_system) as f64 > target
            && non_system.len() > MIN_TAIL_MESSAGES
        {
            non_system.remove(0);
        }

        let dropped = original_non_system_len - non_system.len();

        let mut rebuilt = system_msgs;
        if dropped > 0 {
            let mut marker = format!("[Context compacted: {dropped} earlier messages removed.]");
            if let Some(instructions) = instructions {
                marker.push_str(&format!(" {instructions}"));
            }
            rebuilt.push(Message::system(marker));
        }
        rebuilt.extend(non_system);

        let estimated_tokens_after = estimate_tokens(&rebuilt);
        session.messages = rebuilt;

        Ok(CompactionReport { dropped, estimated_tokens_after })
    }

    /// The session's current `updated_at` timestamp, used by
    /// `HeartbeatController` to snapshot idle time before a heartbeat
    /// invocation and restore it afterwards.
    pub async fn updated_at(&self, session_id: &str) -> Result<chrono::DateTime<Utc>> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;
        Ok(handle.lock().await.updated_at)
    }

    /// Force-set `updated_at` without touching messages. Used only to
    /// restore the pre-heartbeat timestamp so a heartbeat tick never resets
    /// a session's idle-expiry clock.
    pub async fn set_updated_at(&self, session_id: &str, at: chrono::DateTime<Utc>) -> Result<()> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;
        handle.lock().await.updated_at = at;
        self.save_handle(session_id, &handle).await
    }

    pub async fn estimate_tokens(&self, session_id: &str) -> Result<usize> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;
        let session = handle.lock().await;
        Ok(estimate_tokens(&session.messages))
    }

    async fn save_handle(&self, session_id: &str, handle: &Arc<Mutex<Session>>) -> Result<()> {
        let session = handle.lock().await;
        atomic_write_json(&self.session_path(session_id), &*session)?;
        Ok(())
    }

    pub async fn save(&self, session_id: &str) -> Result<()> {
        let handle = self
            .handle_for(session_id)
            .await
            .ok_or_else(|| crate::error::AgentError::NotFound(session_id.to_string()))?;
        self.save_handle(session_id, &handle).await
    }

    pub async fn save_all(&self) -> Result<()> {
        let ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        for id in ids {
            self.save(&id).await?;
        }
        Ok(())
    }

    pub async fn list(&self) -> Vec<SessionSummary> {
        let mut summaries = Vec::new();
        for handle in self.sessions.read().await.values() {
            let session = handle.lock().await;
            summaries.push(SessionSummary::from(&*session));
        }
        summaries
    }

    /// Start the once-per-minute auto-reset ticker. No-op if
    /// `auto_reset_hour` isn't configured. Returns the shutdown sender's
    /// handle is retained internally; call `stop_auto_reset` to stop it.
    pub fn start_auto_reset(self: &Arc<Self>) {
        let Some(hour) = self.config.auto_reset_hour else { return };
        let (tx, mut rx) = watch::channel(false);

        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = Utc::now();
                        if now.hour() == hour as u32 && now.minute() == 0 {
                            let ids: Vec<String> = store.sessions.read().await.keys().cloned().collect();
                            for id in ids {
                                if let Err(e) = store.reset(&id).await {
                                    warn!(session_id = %id, error = %e, "auto-reset failed");
                                }
                            }
                        }
                    }
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            debug!("auto-reset ticker shutting down");
                            break;
                        }
                    }
                }
            }
        });

        // Best-effort: if already running, drop the old sender (stopping it)
        // before storing the new one. This runs synchronously from the
        // caller's perspective via blocking try_lock since start_auto_reset
        // is not async.
        if let Ok(mut guard) = self.shutdown_tx.try_lock() {
            *guard = Some(tx);
        }
    }

    pub async fn stop_auto_reset(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(true);
        }
    }
}

fn estimate_tokens(messages: &[Message]) -> usize {
    let total_chars: usize = messages.iter().map(|m| m.estimate_chars()).sum();
    total_chars.div_ceil(4)
}

fn estimate_tokens_ref(system: &[Message], non_system: &[Message]) -> usize {
    let total_chars: usize =
        system.iter().map(|m| m.estimate_chars()).sum::<usize>() + non_system.iter().map(|m| m.estimate_chars()).sum::<usize>();
    total_chars.div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &Path, context_limit: usize) -> SessionStore {
        SessionStore::new(SessionStoreConfig::new(dir, context_limit))
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path(), 20_000);
        let a = store.get_or_create("discord", "u1").await;
        let b = store.get_or_create("discord", "u1").await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn append_message_increments_count_and_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path(), 20_000);
        let handle = store.get_or_create("discord", "u1").await;
        let id = handle.lock().await.id.clone();

        store.append_message(&id, Message::user("first")).await.unwrap();
        store.append_message(&id, Message::assistant("second")).await.unwrap();

        let messages = store.get_messages(&id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages.last().unwrap().content.as_deref(), Some("second"));

        let session = handle.lock().await;
        assert_eq!(session.message_count, 2);
    }

    #[tokio::test]
    async fn compaction_preserves_system_messages_and_tail() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path(), 20_000);
        let handle = store.get_or_create("discord", "u1").await;
        let id = handle.lock().await.id.clone();

        store.append_message(&id, Message::system("you are a helpful assistant")).await.unwrap();
        for i in 0..50 {
            store
                .append_message(&id, Message::user(&format!("message number {i} padded with filler text ".repeat(20))))
                .await
                .unwrap();
        }

        let messages = store.get_messages(&id).await.unwrap();
        let system_count = messages.iter().filter(|m| m.role == MessageRole::System).count();
        assert!(system_count >= 1);
        let non_system_tail = messages.iter().filter(|m| m.role != MessageRole::System).count();
        assert!(non_system_tail >= MIN_TAIL_MESSAGES);
    }

    #[tokio::test]
    async fn reset_clears_messages_and_counter() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path(), 20_000);
        let handle = store.get_or_create("discord", "u1").await;
        let id = handle.lock().await.id.clone();
        store.append_message(&id, Message::user("hi")).await.unwrap();

        store.reset(&id).await.unwrap();

        let messages = store.get_messages(&id).await.unwrap();
        assert!(messages.is_empty());
        assert_eq!(handle.lock().await.message_count, 0);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let id;
        {
            let store = store(dir.path(), 20_000);
            let handle = store.get_or_create("discord", "u1").await;
            id = handle.lock().await.id.clone();
            store.append_message(&id, Message::user("persisted")).await.unwrap();
        }

        let reloaded = store(dir.path(), 20_000);
        let messages = reloaded.get_messages(&id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content.as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn list_never_includes_full_messages() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path(), 20_000);
        let handle = store.get_or_create("discord", "u1").await;
        let id = handle.lock().await.id.clone();
        store.append_message(&id, Message::user("hi")).await.unwrap();

        let summaries = store.list().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 1);
    }
}
