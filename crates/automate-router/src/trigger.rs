//! Dispatches a fired [`Job`] to the [`ManagedAgent`] that owns it: a
//! `Heartbeat` job runs the heartbeat checklist, a `Prompt` job is appended
//! and processed as an ordinary message on its session.

use std::sync::Arc;

use async_trait::async_trait;
use automate_models::{Job, JobKind};
use automate_scheduler::TriggerHandler;
use tracing::warn;

use crate::managed_agent::ManagedAgent;

pub struct AgentTriggerHandler {
    agent: Arc<ManagedAgent>,
}

impl AgentTriggerHandler {
    pub fn new(agent: Arc<ManagedAgent>) -> Self {
        AgentTriggerHandler { agent }
    }
}

#[async_trait]
impl TriggerHandler for AgentTriggerHandler {
    async fn on_fire(&self, job: &Job) {
        match &job.kind {
            JobKind::Heartbeat { .. } => {
                if let Err(e) = self.agent.heartbeat.trigger().await {
                    warn!(agent = %self.agent.profile.name, job = %job.name, error = %e, "heartbeat trigger failed");
                }
            }
            JobKind::Prompt { text } => {
                let session_id = match &job.session_id {
                    Some(id) => id.clone(),
                    None => {
                        warn!(agent = %self.agent.profile.name, job = %job.name, "prompt job fired with no target session");
                        return;
                    }
                };
                if let Err(e) = self.agent.process_message(&session_id, text).await {
                    warn!(agent = %self.agent.profile.name, job = %job.name, error = %e, "scheduled prompt dispatch failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait as async_trait_attr;
    use automate_agent::{AgentCapability, HeartbeatConfig, MemoryManagerConfig, SessionStore, SessionStoreConfig};
    use automate_memory::HashEmbeddingClient;
    use automate_models::{AgentProfile, Schedule};
    use automate_skills::{SkillLoader, SkillWatcher};
    use tempfile::TempDir;

    struct EchoCapability;
    #[async_trait_attr]
    impl AgentCapability for EchoCapability {
        async fn process_message(&self, _session_id: &str, prompt: &str) -> automate_agent::Result<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    async fn build_agent(dir: &std::path::Path) -> Arc<ManagedAgent> {
        let profile = AgentProfile::new("t");
        let session_store = Arc::new(SessionStore::new(SessionStoreConfig::new(dir.join("sessions"), 100_000)));
        let memory = Arc::new(automate_agent::MemoryManager::new(
            MemoryManagerConfig::new(dir.join("memory")),
            Arc::new(HashEmbeddingClient::new(16)),
        ));
        let skills = Arc::new(SkillLoader::new(dir.join("skills"), vec![]));
        let skill_watcher = Arc::new(SkillWatcher::new(skills.clone()));
        let heartbeat = Arc::new(automate_agent::HeartbeatController::new(
            HeartbeatConfig { memory_dir: dir.join("memory"), target_session: "s1".into(), agent_name: None },
            session_store.clone(),
            memory.clone(),
            Arc::new(EchoCapability),
        ));
        Arc::new(ManagedAgent::new(
            profile,
            session_store,
            memory,
            skills,
            skill_watcher,
            heartbeat,
            Arc::new(EchoCapability),
        ))
    }

    #[tokio::test]
    async fn prompt_job_appends_and_processes_on_its_session() {
        let dir = TempDir::new().unwrap();
        let agent = build_agent(dir.path()).await;
        agent.session_store.get_or_create("chan", "u1").await;
        let session_id = automate_models::Session::make_id("chan", "u1");

        let handler = AgentTriggerHandler::new(agent.clone());
        let job = Job::new(
            "scheduled-prompt",
            JobKind::Prompt { text: "ping".into() },
            Schedule::Once { at: chrono::Utc::now() },
        )
        .with_session(session_id.clone());

        handler.on_fire(&job).await;

        let messages = agent.session_store.get_messages(&session_id).await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn heartbeat_job_with_no_checklist_is_skipped_without_panicking() {
        let dir = TempDir::new().unwrap();
        let agent = build_agent(dir.path()).await;
        agent.memory.ensure_defaults().unwrap();
        agent.session_store.get_or_create("chan", "u1").await;

        let handler = AgentTriggerHandler::new(agent.clone());
        let job = Job::new(
            "__heartbeat__",
            JobKind::Heartbeat { agent_name: None },
            Schedule::Once { at: chrono::Utc::now() },
        );

        handler.on_fire(&job).await;
    }
}
