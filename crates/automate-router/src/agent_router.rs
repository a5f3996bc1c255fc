//! Routes an incoming session to a [`ManagedAgent`] by channel pattern and
//! `allowFrom`, overlaying each profile's overrides onto the base config to
//! build that agent's directories, session store, memory and scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use automate_agent::{
    AgentCapability, HeartbeatConfig, HeartbeatController, MemoryManager, MemoryManagerConfig, SessionStore,
    SessionStoreConfig,
};
use automate_config::Config;
use automate_memory::{EmbeddingClient, HashEmbeddingClient, HttpEmbeddingClient};
use automate_models::{AgentProfile, JobKind, Schedule};
use automate_scheduler::{JobStore, Scheduler};
use automate_skills::{SkillLoader, SkillWatcher};
use tokio::sync::RwLock;
use tracing::warn;

use crate::channel_pattern::matches_any;
use crate::error::{Result, RouterError};
use crate::managed_agent::ManagedAgent;
use crate::trigger::AgentTriggerHandler;

/// Builds the `Arc<dyn AgentCapability>` that drives a given profile. The
/// router never looks up a driver globally; it's always supplied by the
/// caller.
pub type CapabilityFactory = Arc<dyn Fn(&AgentProfile) -> Arc<dyn AgentCapability> + Send + Sync>;

struct AgentEntry {
    profile: AgentProfile,
    agent: Arc<ManagedAgent>,
    scheduler: Arc<Scheduler>,
}

pub struct AgentRouter {
    entries: RwLock<Vec<AgentEntry>>,
    default_name: RwLock<Option<String>>,
}

fn embedding_client(config: &Config) -> Arc<dyn EmbeddingClient> {
    match (&config.memory.embedding.api_base, &config.memory.embedding.api_key) {
        (Some(base), Some(key)) => Arc::new(HttpEmbeddingClient::new(
            base.clone(),
            key.clone(),
            config.memory.embedding.model.clone().unwrap_or_else(|| "text-embedding-3-small".to_string()),
            1536,
        )),
        _ => Arc::new(HashEmbeddingClient::new(256)),
    }
}

impl AgentRouter {
    pub fn new() -> Self {
        AgentRouter { entries: RwLock::new(Vec::new()), default_name: RwLock::new(None) }
    }

    /// Build a `ManagedAgent` (with its own scheduler) for each profile and
    /// register it in definition order. The first profile becomes the
    /// default agent.
    pub async fn init_agents(
        &self,
        profiles: Vec<AgentProfile>,
        base: &Config,
        capability_factory: CapabilityFactory,
    ) -> Result<()> {
        let mut entries = Vec::with_capacity(profiles.len());

        for profile in profiles {
            let entry = self.build_entry(&profile, base, &capability_factory).await?;
            entries.push(entry);
        }

        let default_name = entries.first().map(|e| e.profile.name.clone());

        let mut guard = self.entries.write().await;
        *guard = entries;
        drop(guard);
        *self.default_name.write().await = default_name;

        Ok(())
    }

    async fn build_entry(
        &self,
        profile: &AgentProfile,
        base: &Config,
        capability_factory: &CapabilityFactory,
    ) -> Result<AgentEntry> {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let (default_memory, default_sessions, default_skills) = AgentProfile::default_dirs(&home, &profile.name);

        let memory_dir = profile.memory_dir.clone().unwrap_or(default_memory);
        let sessions_dir = profile.sessions_dir.clone().unwrap_or(default_sessions);
        let skills_dir = profile.skills_dir.clone().unwrap_or(default_skills);
        let cron_dir = base.cron.directory.join(&profile.name);

        let session_store = Arc::new(SessionStore::new(SessionStoreConfig {
            directory: sessions_dir,
            context_limit: base.sessions.context_limit as usize,
            compact_at: base.sessions.compact_at as f64,
            auto_reset_hour: base.sessions.auto_reset_hour,
        }));
        session_store.start_auto_reset();

        let memory = Arc::new(MemoryManager::new(MemoryManagerConfig::new(memory_dir.clone()), embedding_client(base)));
        memory.ensure_defaults()?;

        let skills = Arc::new(SkillLoader::new(skills_dir, base.skills.extra_dirs.clone()));
        skills.load_all().await?;
        let skill_watcher = Arc::new(SkillWatcher::new(skills.clone()));
        skill_watcher.start_watching().await;

        let capability = capability_factory(profile);

        let target_session = format!("heartbeat:{}", profile.name);
        session_store.get_or_create("heartbeat", &profile.name).await;
        let heartbeat = Arc::new(HeartbeatController::new(
            HeartbeatConfig { memory_dir, target_session, agent_name: Some(profile.name.clone()) },
            session_store.clone(),
            memory.clone(),
            capability.clone(),
        ));
        if let Err(e) = heartbeat.load_log().await {
            warn!(agent = %profile.name, error = %e, "failed to load heartbeat log");
        }

        let agent = Arc::new(ManagedAgent::new(
            profile.clone(),
            session_store,
            memory,
            skills,
            skill_watcher,
            heartbeat.clone(),
            capability,
        ));
        agent.start_background_index_build();

        let job_store = Arc::new(JobStore::new(cron_dir));
        if let Err(e) = job_store.load().await {
            warn!(agent = %profile.name, error = %e, "failed to load scheduled jobs");
        }
        let handler = Arc::new(AgentTriggerHandler::new(agent.clone()));
        let scheduler = Arc::new(Scheduler::new(job_store, handler));
        if base.cron.enabled {
            scheduler.start();
        }

        if base.heartbeat.enabled {
            let every_ms = base.heartbeat.interval_minutes as i64 * 60_000;
            if scheduler.find_by_name(&JobKind::Heartbeat { agent_name: Some(profile.name.clone()) }.display_name()).await.is_none()
            {
                let _ = scheduler
                    .add_job(
                        JobKind::Heartbeat { agent_name: Some(profile.name.clone()) }.display_name(),
                        JobKind::Heartbeat { agent_name: Some(profile.name.clone()) },
                        Schedule::Interval { every_ms },
                        None,
                    )
                    .await;
            }
            heartbeat.start(Some(base.heartbeat.interval_minutes), false).await;
        }

        Ok(AgentEntry { profile: profile.clone(), agent, scheduler })
    }

    /// Route a session to the agent that should handle it, falling back to
    /// the default agent when nothing matches.
    pub async fn route(&self, session_id: &str, user_id: Option<&str>) -> Option<Arc<ManagedAgent>> {
        let entries = self.entries.read().await;
        for entry in entries.iter() {
            if !matches_any(&entry.profile.channels, session_id) {
                continue;
            }
            let allowed = entry.profile.allow_from.iter().any(|v| v == "*")
                || user_id.map(|u| entry.profile.allow_from.iter().any(|v| v == u)).unwrap_or(false);
            if allowed {
                return Some(entry.agent.clone());
            }
        }
        drop(entries);
        self.get_default().await
    }

    pub async fn process_message(&self, session_id: &str, message: &str, user_id: Option<&str>) -> Result<String> {
        let agent = self.route(session_id, user_id).await.ok_or(RouterError::NoAgentsRegistered)?;
        Ok(agent.process_message(session_id, message).await?)
    }

    /// `/agents switch <name>` — accepts any currently registered name.
    pub async fn handle_switch_command(&self, name: &str) -> Result<()> {
        let entries = self.entries.read().await;
        if !entries.iter().any(|e| e.profile.name == name) {
            return Err(RouterError::UnknownAgent(name.to_string()));
        }
        drop(entries);
        *self.default_name.write().await = Some(name.to_string());
        Ok(())
    }

    pub async fn get_agent(&self, name: &str) -> Option<Arc<ManagedAgent>> {
        self.entries.read().await.iter().find(|e| e.profile.name == name).map(|e| e.agent.clone())
    }

    /// The scheduler owned by a named agent, for job administration; each
    /// `ManagedAgent` owns at most one.
    pub async fn get_scheduler(&self, name: &str) -> Option<Arc<Scheduler>> {
        self.entries.read().await.iter().find(|e| e.profile.name == name).map(|e| e.scheduler.clone())
    }

    pub async fn get_all(&self) -> Vec<Arc<ManagedAgent>> {
        self.entries.read().await.iter().map(|e| e.agent.clone()).collect()
    }

    pub async fn get_default(&self) -> Option<Arc<ManagedAgent>> {
        let name = self.default_name.read().await.clone()?;
        self.get_agent(&name).await
    }

    pub async fn shutdown(&self) {
        let entries = self.entries.read().await;
        for entry in entries.iter() {
            entry.scheduler.stop().await;
            entry.agent.shutdown().await;
        }
    }
}

impl Default for AgentRouter {
    fn default() -> Self {
        AgentRouter::new()
    }
}
