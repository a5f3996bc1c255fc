//! automate CLI library: config resolution, the demo agent driver, and
//! command handlers shared by the `automate` binary.

pub mod cli;
pub mod commands;
pub mod driver;
pub mod repl;

use std::path::PathBuf;

use automate_config::{Config, ConfigLoader};
use automate_router::AgentRouter;

/// Run the full ConfigLoader → AgentRouter wiring, registering every
/// configured profile (or a single catch-all default if none are
/// configured).
pub async fn build_router(home: PathBuf, explicit_config: Option<PathBuf>) -> Result<(AgentRouter, Config), String> {
    let mut loader = ConfigLoader::new(home);
    if let Some(path) = explicit_config {
        loader = loader.with_path(path);
    }
    let config = loader.load().map_err(|e| e.to_string())?;

    let profiles = if config.agents.is_empty() { vec![commands::default_profile()] } else { config.agents.clone() };

    let router = AgentRouter::new();
    router
        .init_agents(profiles, &config, commands::capability_factory(&config))
        .await
        .map_err(|e| e.to_string())?;

    Ok((router, config))
}

pub fn resolve_home(explicit: Option<PathBuf>) -> PathBuf {
    explicit.or_else(dirs::home_dir).unwrap_or_else(|| PathBuf::from("."))
}
