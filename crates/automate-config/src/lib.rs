//! Layered configuration loading: file discovery, `_includes` resolution,
//! environment-variable substitution and override, schema validation with
//! defaults, and `~`-path resolution against the user's home directory.

pub mod error;
pub mod includes;
pub mod loader;
pub mod merge;
pub mod overrides;
pub mod paths;
pub mod schema;
pub mod substitution;

pub use error::{ConfigError, Result};
pub use loader::{candidate_paths, resolve_config_path, ConfigLoader};
pub use schema::{
    AgentConfig, Config, CronConfig, EmbeddingConfig, HeartbeatConfig, MemoryConfig, SessionsConfig, SkillsConfig,
    ToolsConfig,
};
