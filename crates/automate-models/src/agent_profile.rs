//! Agent profile types: configuration-time description of a managed agent.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A named agent profile with optional overrides layered onto base config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub memory_dir: Option<PathBuf>,
    #[serde(default)]
    pub sessions_dir: Option<PathBuf>,
    #[serde(default)]
    pub skills_dir: Option<PathBuf>,
    #[serde(default)]
    pub tools_allow: Vec<String>,
    #[serde(default)]
    pub tools_deny: Vec<String>,
    /// Glob-style channel patterns this agent may be routed to (`*`/`?`).
    #[serde(default)]
    pub channels: Vec<String>,
    /// User ids (or `*`) allowed to be routed to this agent.
    #[serde(default)]
    pub allow_from: Vec<String>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
            api_base: None,
            api_key: None,
            max_tokens: None,
            temperature: None,
            memory_dir: None,
            sessions_dir: None,
            skills_dir: None,
            tools_allow: Vec::new(),
            tools_deny: Vec::new(),
            channels: Vec::new(),
            allow_from: Vec::new(),
        }
    }

    /// Default per-agent data directories: `<home>/.automate/agents/<name>/{memory,sessions,skills}`.
    pub fn default_dirs(home: &std::path::Path, name: &str) -> (PathBuf, PathBuf, PathBuf) {
        let base = home.join(".automate").join("agents").join(name);
        (
            base.join("memory"),
            base.join("sessions"),
            base.join("skills"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dirs_are_namespaced_by_agent_name() {
        let home = std::path::Path::new("/home/u");
        let (mem, sess, skills) = AgentProfile::default_dirs(home, "coder");
        assert_eq!(mem, std::path::PathBuf::from("/home/u/.automate/agents/coder/memory"));
        assert_eq!(sess, std::path::PathBuf::from("/home/u/.automate/agents/coder/sessions"));
        assert_eq!(skills, std::path::PathBuf::from("/home/u/.automate/agents/coder/skills"));
    }
}
