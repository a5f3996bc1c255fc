//! Command handlers for CLI subcommands, dispatching onto a wired
//! `AgentRouter`.

use std::sync::Arc;

use automate_config::Config;
use automate_models::{AgentProfile, JobKind, Schedule};
use automate_router::AgentRouter;

use crate::cli::{AgentsAction, JobsAction, MemoryAction};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Resolve `--agent NAME`, falling back to the router's default agent.
async fn resolve_agent_name(router: &AgentRouter, requested: Option<&str>) -> Result<String> {
    if let Some(name) = requested {
        return Ok(name.to_string());
    }
    let default = router.get_default().await.ok_or("no agents configured")?;
    Ok(default.profile.name.clone())
}

pub async fn agents(router: &AgentRouter, action: AgentsAction) -> Result<()> {
    match action {
        AgentsAction::List => {
            let default_name = router.get_default().await.map(|a| a.profile.name.clone());
            for agent in router.get_all().await {
                let marker = if Some(&agent.profile.name) == default_name.as_ref() { " (default)" } else { "" };
                println!("{}{marker}", agent.profile.name);
                println!("  channels:   {:?}", agent.profile.channels);
                println!("  allowFrom:  {:?}", agent.profile.allow_from);
            }
            Ok(())
        }
        AgentsAction::Switch { name } => {
            router.handle_switch_command(&name).await?;
            println!("default agent switched to '{name}'");
            Ok(())
        }
    }
}

pub async fn memory(router: &AgentRouter, action: MemoryAction) -> Result<()> {
    match action {
        MemoryAction::Index { agent } => {
            let name = resolve_agent_name(router, agent.as_deref()).await?;
            let agent = router.get_agent(&name).await.ok_or("unknown agent")?;
            let (indexed, skipped, removed) = agent.memory.index_all().await?;
            println!("indexed={indexed} skipped={skipped} removed={removed}");
            Ok(())
        }
        MemoryAction::Search { query, limit, agent } => {
            let name = resolve_agent_name(router, agent.as_deref()).await?;
            let agent = router.get_agent(&name).await.ok_or("unknown agent")?;
            let results = agent.memory.semantic_search(&query, limit).await?;
            for r in results {
                println!("[{:.3}] ({:?}) {}", r.score, r.source, r.file);
                let preview: String = r.text.chars().take(160).collect();
                println!("    {preview}");
            }
            Ok(())
        }
    }
}

pub async fn jobs(router: &AgentRouter, action: JobsAction) -> Result<()> {
    match action {
        JobsAction::List { agent } => {
            let name = resolve_agent_name(router, agent.as_deref()).await?;
            let scheduler = router.get_scheduler(&name).await.ok_or("unknown agent")?;
            for job in scheduler.list_jobs().await {
                println!(
                    "{} [{}] enabled={} next_run={:?} runs={}",
                    job.id, job.name, job.enabled, job.next_run, job.run_count
                );
            }
            Ok(())
        }
        JobsAction::Add { name, prompt, at, every_ms, cron, session, agent } => {
            let agent_name = resolve_agent_name(router, agent.as_deref()).await?;
            let scheduler = router.get_scheduler(&agent_name).await.ok_or("unknown agent")?;

            let schedule = if let Some(at) = at {
                let parsed = chrono::DateTime::parse_from_rfc3339(&at)
                    .map_err(|e| format!("'{at}' is not a valid ISO-8601 instant: {e}"))?;
                Schedule::Once { at: parsed.with_timezone(&chrono::Utc) }
            } else if let Some(every_ms) = every_ms {
                Schedule::Interval { every_ms }
            } else if let Some(expression) = cron {
                Schedule::Cron { expression }
            } else {
                return Err("one of --at, --every-ms, or --cron is required".into());
            };

            let job = scheduler.add_job(name, JobKind::Prompt { text: prompt }, schedule, session).await?;
            println!("added job {}", job.id);
            Ok(())
        }
        JobsAction::Remove { id, agent } => {
            let name = resolve_agent_name(router, agent.as_deref()).await?;
            let scheduler = router.get_scheduler(&name).await.ok_or("unknown agent")?;
            if scheduler.remove_job(&id).await? {
                println!("removed {id}");
            } else {
                println!("no such job: {id}");
            }
            Ok(())
        }
        JobsAction::Enable { id, agent } => {
            let name = resolve_agent_name(router, agent.as_deref()).await?;
            let scheduler = router.get_scheduler(&name).await.ok_or("unknown agent")?;
            scheduler.enable_job(&id).await?;
            println!("enabled {id}");
            Ok(())
        }
        JobsAction::Disable { id, agent } => {
            let name = resolve_agent_name(router, agent.as_deref()).await?;
            let scheduler = router.get_scheduler(&name).await.ok_or("unknown agent")?;
            scheduler.disable_job(&id).await?;
            println!("disabled {id}");
            Ok(())
        }
    }
}

pub async fn sessions(router: &AgentRouter, agent: Option<String>) -> Result<()> {
    let name = resolve_agent_name(router, agent.as_deref()).await?;
    let agent = router.get_agent(&name).await.ok_or("unknown agent")?;
    for summary in agent.session_store.list().await {
        println!(
            "{} channel={} user={} messages={} updated={}",
            summary.id, summary.channel, summary.user_id, summary.message_count, summary.updated_at
        );
    }
    Ok(())
}

pub async fn skills(router: &AgentRouter, agent: Option<String>) -> Result<()> {
    let name = resolve_agent_name(router, agent.as_deref()).await?;
    let agent = router.get_agent(&name).await.ok_or("unknown agent")?;
    for skill in agent.skills.list_skills().await {
        println!("{} {}", skill.metadata.emoji.as_deref().unwrap_or("*"), skill.name);
    }
    for skipped in agent.skills.list_skipped_skills().await {
        println!("(skipped) {} — {}", skipped.name, skipped.reason);
    }
    Ok(())
}

pub fn print_config(config: &Config) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Default agent profile used when no `agents[]` are configured: a single
/// catch-all agent routed from any channel for any user.
pub fn default_profile() -> AgentProfile {
    let mut profile = AgentProfile::new("default");
    profile.channels = vec!["*".to_string()];
    profile.allow_from = vec!["*".to_string()];
    profile
}

pub fn capability_factory(config: &Config) -> automate_router::CapabilityFactory {
    let base_api_base = config.agent.api_base.clone();
    let base_api_key = config.agent.api_key.clone();
    let base_model = config.agent.model.clone();

    Arc::new(move |profile: &AgentProfile| {
        let api_base = profile.api_base.clone().or_else(|| base_api_base.clone());
        let api_key = profile.api_key.clone().or_else(|| base_api_key.clone());
        let model = profile.model.clone().unwrap_or_else(|| base_model.clone());
        let driver = crate::driver::DemoAgentDriver::new(api_base, api_key, model);
        Arc::new(driver) as Arc<dyn automate_agent::AgentCapability>
    })
}
