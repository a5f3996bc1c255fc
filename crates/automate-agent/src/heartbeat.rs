//! Periodic checklist-driven self-invocation, with ack filtering and
//! preservation of the target session's idle-expiry timestamp.
//!
//! The actual scheduling (registering a `__heartbeat__` job with
//! `automate-scheduler` and calling [`HeartbeatController::trigger`] when it
//! fires) is owned by whatever composes a `ManagedAgent`
//! (`automate-router`): this controller only tracks its own active/interval
//! state and the classification/log of each trigger, so it never needs a
//! dependency on the scheduler crate.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use automate_persistence::{atomic_write_json, read_json_tolerant, DropCounter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::warn;

use crate::capability::AgentCapability;
use crate::error::Result;
use crate::memory_manager::{is_effectively_empty, IdentityFile, MemoryManager};
use crate::session_store::SessionStore;

/// Rolling window size for the heartbeat log.
const LOG_CAP: usize = 200;
/// A response this long or shorter is eligible to be classified as a bare
/// acknowledgement.
const ACK_MAX_LEN: usize = 200;
const ACK_TOKEN: &str = "HEARTBEAT_OK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeartbeatStatus {
    Skipped,
    OkEmpty,
    OkToken,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatEntry {
    pub timestamp: DateTime<Utc>,
    pub status: HeartbeatStatus,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum HeartbeatEvent {
    /// One incremental piece of the agent's reply while a trigger is in flight.
    Stream { agent_name: Option<String>, chunk: String },
    /// A user-visible alert: the trigger's reply needed attention.
    Alert { agent_name: Option<String>, content: String },
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct LogFile {
    entries: Vec<HeartbeatEntry>,
}

pub struct HeartbeatConfig {
    pub memory_dir: PathBuf,
    pub target_session: String,
    pub agent_name: Option<String>,
}

pub struct HeartbeatController {
    session_store: Arc<SessionStore>,
    memory: Arc<MemoryManager>,
    agent: Arc<dyn AgentCapability>,
    agent_name: Option<String>,
    target_session: RwLock<String>,
    log_path: PathBuf,
    log: RwLock<Vec<HeartbeatEntry>>,
    broadcaster: broadcast::Sender<HeartbeatEvent>,
    active: AtomicBool,
    interval_minutes: RwLock<Option<u32>>,
    drop_counter: DropCounter,
}

impl HeartbeatController {
    pub fn new(
        config: HeartbeatConfig,
        session_store: Arc<SessionStore>,
        memory: Arc<MemoryManager>,
        agent: Arc<dyn AgentCapability>,
    ) -> Self {
        let (tx, _rx) = broadcast::channel(64);
        HeartbeatController {
            session_store,
            memory,
            agent,
            agent_name: config.agent_name,
            target_session: RwLock::new(config.target_session),
            log_path: config.memory_dir.join("heartbeat-log.json"),
            log: RwLock::new(Vec::new()),
            broadcaster: tx,
            active: AtomicBool::new(false),
            interval_minutes: RwLock::new(None),
            drop_counter: DropCounter::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HeartbeatEvent> {
        self.broadcaster.subscribe()
    }

    pub async fn load_log(&self) -> Result<()> {
        match read_json_tolerant::<LogFile>(&self.log_path) {
            Some(file) => *self.log.write().await = file.entries,
            None if self.log_path.exists() => {
                self.drop_counter.record(&self.log_path, "corrupt heartbeat log");
            }
            None => {}
        }
        Ok(())
    }

    pub async fn set_target_session(&self, session_id: impl Into<String>) {
        *self.target_session.write().await = session_id.into();
    }

    /// Start is a local enable: `force=true` discards any previously
    /// configured interval before re-enabling rather than just re-affirming
    /// it, mirroring "delete and recreate with the new interval" (the job
    /// add/remove itself is the composing router's responsibility).
    pub async fn start(&self, interval_minutes: Option<u32>, force: bool) {
        if force || !self.active.load(Ordering::SeqCst) {
            *self.interval_minutes.write().await = interval_minutes;
        }
        self.active.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub async fn interval_minutes(&self) -> Option<u32> {
        *self.interval_minutes.read().await
    }

    pub async fn get_log(&self, limit: usize) -> Vec<HeartbeatEntry> {
        let log = self.log.read().await;
        log.iter().rev().take(limit).cloned().collect()
    }

    async fn append_log(&self, entry: HeartbeatEntry) -> Result<()> {
        let mut log = self.log.write().await;
        log.push(entry);
        if log.len() > LOG_CAP {
            let drain_to = log.len() - LOG_CAP;
            log.drain(0..drain_to);
        }
        let file = LogFile { entries: log.clone() };
        atomic_write_json(&self.log_path, &file)?;
        Ok(())
    }

    /// Run one heartbeat tick. Returns `Some(alert content)` only when the
    /// response needed user attention.
    pub async fn trigger(&self) -> Result<Option<String>> {
        let session_id = self.target_session.read().await.clone();

        let heartbeat_md = self
            .memory
            .get_identity_file(IdentityFile::Heartbeat)?
            .unwrap_or_default();

        if is_effectively_empty(&heartbeat_md) {
            self.append_log(HeartbeatEntry {
                timestamp: Utc::now(),
                status: HeartbeatStatus::Skipped,
                session_id,
                agent_name: self.agent_name.clone(),
                content: None,
                response_length: None,
                error: None,
            })
            .await?;
            return Ok(None);
        }

        let captured_updated_at = self.session_store.updated_at(&session_id).await?;
        let prompt = build_checklist_prompt(&heartbeat_md);

        let tx = self.broadcaster.clone();
        let agent_name_for_chunk = self.agent_name.clone();
        let on_chunk = move |chunk: &str| {
            let _ = tx.send(HeartbeatEvent::Stream {
                agent_name: agent_name_for_chunk.clone(),
                chunk: chunk.to_string(),
            });
        };

        let response = match self
            .agent
            .process_message_streaming(&session_id, &prompt, &on_chunk)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "heartbeat trigger failed");
                self.append_log(HeartbeatEntry {
                    timestamp: Utc::now(),
                    status: HeartbeatStatus::Failed,
                    session_id,
                    agent_name: self.agent_name.clone(),
                    content: None,
                    response_length: None,
                    error: Some(e.to_string()),
                })
                .await?;
                return Ok(None);
            }
        };

        // Restore the pre-trigger timestamp so a heartbeat never resets the
        // session's idle-expiry clock.
        self.session_store.set_updated_at(&session_id, captured_updated_at).await?;

        let trimmed = response.trim();

        if trimmed.is_empty() {
            self.append_log(HeartbeatEntry {
                timestamp: Utc::now(),
                status: HeartbeatStatus::OkEmpty,
                session_id,
                agent_name: self.agent_name.clone(),
                content: None,
                response_length: Some(0),
                error: None,
            })
            .await?;
            return Ok(None);
        }

        let char_len = trimmed.chars().count();
        let is_ack = char_len <= ACK_MAX_LEN
            && (trimmed.starts_with(ACK_TOKEN) || trimmed.ends_with(ACK_TOKEN));

        if is_ack {
            self.append_log(HeartbeatEntry {
                timestamp: Utc::now(),
                status: HeartbeatStatus::OkToken,
                session_id,
                agent_name: self.agent_name.clone(),
                content: None,
                response_length: Some(char_len),
                error: None,
            })
            .await?;
            return Ok(None);
        }

        let _ = self.broadcaster.send(HeartbeatEvent::Alert {
            agent_name: self.agent_name.clone(),
            content: trimmed.to_string(),
        });

        self.append_log(HeartbeatEntry {
            timestamp: Utc::now(),
            status: HeartbeatStatus::Sent,
            session_id,
            agent_name: self.agent_name.clone(),
            content: Some(trimmed.to_string()),
            response_length: Some(char_len),
            error: None,
        })
        .await?;

        Ok(Some(trimmed.to_string()))
    }
}

fn build_checklist_prompt(heartbeat_md: &str) -> String {
    format!(
        "[HEARTBEAT CHECK]\n\nFollow the checklist below strictly. Do not hallucinate \
         work you did not do. If nothing needs attention, reply with exactly \
         HEARTBEAT_OK and nothing else.\n\n---\n{heartbeat_md}\n---"
    )
}
