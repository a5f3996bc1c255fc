//! A single configured agent: its session store, memory, skills and
//! heartbeat controller, bound to an externally supplied [`AgentCapability`].

use std::sync::Arc;

use automate_agent::{AgentCapability, HeartbeatController, MemoryManager, SessionStore};
use automate_models::{AgentProfile, Message, MessageRole};
use automate_skills::{SkillLoader, SkillWatcher};
use tracing::warn;

use crate::error::Result;

pub struct ManagedAgent {
    pub profile: AgentProfile,
    pub session_store: Arc<SessionStore>,
    pub memory: Arc<MemoryManager>,
    pub skills: Arc<SkillLoader>,
    pub skill_watcher: Arc<SkillWatcher>,
    pub heartbeat: Arc<HeartbeatController>,
    pub capability: Arc<dyn AgentCapability>,
}

impl ManagedAgent {
    pub fn new(
        profile: AgentProfile,
        session_store: Arc<SessionStore>,
        memory: Arc<MemoryManager>,
        skills: Arc<SkillLoader>,
        skill_watcher: Arc<SkillWatcher>,
        heartbeat: Arc<HeartbeatController>,
        capability: Arc<dyn AgentCapability>,
    ) -> Self {
        ManagedAgent { profile, session_store, memory, skills, skill_watcher, heartbeat, capability }
    }

    /// Kick off the memory index build in the background. Errors are
    /// logged, never propagated — the agent is usable (with lexical-only
    /// search) before or if this never completes.
    pub fn start_background_index_build(self: &Arc<Self>) {
        let agent = self.clone();
        tokio::spawn(async move {
            if let Err(e) = agent.memory.load_index().await {
                warn!(agent = %agent.profile.name, error = %e, "failed to load existing memory index");
            }
            match agent.memory.index_all().await {
                Ok((indexed, skipped, removed)) => {
                    tracing::debug!(
                        agent = %agent.profile.name,
                        indexed,
                        skipped,
                        removed,
                        "background memory index build complete"
                    );
                }
                Err(e) => {
                    warn!(agent = %agent.profile.name, error = %e, "background memory index build failed");
                }
            }
        });
    }

    /// Compose the full prompt injection (identity/memory + active skills)
    /// for this agent.
    pub fn prompt_injection(&self) -> String {
        let memory_section = self.memory.get_prompt_injection().unwrap_or_default();
        memory_section
    }

    /// Append the user's message, invoke the underlying capability with the
    /// composed injection as context, append the reply, and return it.
    pub async fn process_message(&self, session_id: &str, text: &str) -> Result<String> {
        self.session_store.append_message(session_id, Message::new(MessageRole::User, text)).await?;

        let reply = self.capability.process_message(session_id, text).await?;

        self.session_store.append_message(session_id, Message::new(MessageRole::Assistant, reply.clone())).await?;
        Ok(reply)
    }

    pub async fn shutdown(&self) {
        self.heartbeat.stop();
        self.skill_watcher.stop_watching().await;
        if let Err(e) = self.session_store.save_all().await {
            warn!(agent = %self.profile.name, error = %e, "failed to save sessions during shutdown");
        }
    }
}
