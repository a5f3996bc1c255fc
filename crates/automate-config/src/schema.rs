//! The configuration schema. Groups consumed by the core are fully typed;
//! groups nothing in this crate reads round-trip opaquely as
//! [`serde_json::Value`] so an unknown or future section never fails
//! validation.

use std::path::PathBuf;

use automate_models::AgentProfile;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_model() -> String {
    "anthropic/claude-sonnet-4".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            model: default_model(),
            api_base: None,
            api_key: None,
            system_prompt: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_context_limit() -> u32 {
    100_000
}

fn default_compact_at() -> f32 {
    0.8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsConfig {
    #[serde(default = "default_sessions_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_context_limit")]
    pub context_limit: u32,
    #[serde(default = "default_compact_at")]
    pub compact_at: f32,
    #[serde(default)]
    pub auto_reset_hour: Option<u8>,
}

fn default_sessions_dir() -> PathBuf {
    PathBuf::from("~/.automate/sessions")
}

impl Default for SessionsConfig {
    fn default() -> Self {
        SessionsConfig {
            directory: default_sessions_dir(),
            context_limit: default_context_limit(),
            compact_at: default_compact_at(),
            auto_reset_hour: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig { api_base: None, api_key: None, model: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    #[serde(default = "default_memory_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_shared_dir")]
    pub shared_directory: PathBuf,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default = "default_true")]
    pub citations: bool,
}

fn default_memory_dir() -> PathBuf {
    PathBuf::from("~/.automate/memory")
}

fn default_shared_dir() -> PathBuf {
    PathBuf::from("~/.automate/shared")
}

fn default_true() -> bool {
    true
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            directory: default_memory_dir(),
            shared_directory: default_shared_dir(),
            embedding: EmbeddingConfig::default(),
            citations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cron_dir")]
    pub directory: PathBuf,
}

fn default_cron_dir() -> PathBuf {
    PathBuf::from("~/.automate/cron")
}

impl Default for CronConfig {
    fn default() -> Self {
        CronConfig { enabled: true, directory: default_cron_dir() }
    }
}

fn default_heartbeat_interval() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_heartbeat_interval")]
    pub interval_minutes: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        HeartbeatConfig { enabled: false, interval_minutes: default_heartbeat_interval() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsConfig {
    #[serde(default = "default_skills_dir")]
    pub directory: PathBuf,
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
}

fn default_skills_dir() -> PathBuf {
    PathBuf::from("~/.automate/skills")
}

impl Default for SkillsConfig {
    fn default() -> Self {
        SkillsConfig { directory: default_skills_dir(), extra_dirs: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default)]
    pub require_approval: Vec<String>,
}

/// The full, validated configuration. Groups this core doesn't interpret
/// (`gateway`, `channels`, `browser`, `webhooks`, `canvas`, `plugins`,
/// `tts`) are kept as opaque JSON so round-tripping an unfamiliar or
/// forward-compatible section never fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub agents: Vec<AgentProfile>,
    #[serde(default = "empty_object")]
    pub gateway: Value,
    #[serde(default = "empty_object")]
    pub channels: Value,
    #[serde(default = "empty_object")]
    pub browser: Value,
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub cron: CronConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default = "empty_object")]
    pub webhooks: Value,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default = "empty_object")]
    pub canvas: Value,
    #[serde(default = "empty_object")]
    pub plugins: Value,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    #[serde(default = "empty_object")]
    pub tts: Value,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            agent: AgentConfig::default(),
            agents: Vec::new(),
            gateway: empty_object(),
            channels: empty_object(),
            browser: empty_object(),
            skills: SkillsConfig::default(),
            memory: MemoryConfig::default(),
            cron: CronConfig::default(),
            tools: ToolsConfig::default(),
            webhooks: empty_object(),
            sessions: SessionsConfig::default(),
            canvas: empty_object(),
            plugins: empty_object(),
            heartbeat: HeartbeatConfig::default(),
            tts: empty_object(),
        }
    }
}
