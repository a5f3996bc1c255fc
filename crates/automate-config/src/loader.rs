//! Orchestrates the full layered config load: locate file,
//! resolve includes, substitute env vars, apply `AUTOMATE_*` overrides,
//! validate against the schema, then resolve and create data directories.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::schema::Config;
use crate::{includes, overrides, paths, substitution};

const STATE_DIR_NAME: &str = ".automate";
const CONFIG_STEM: &str = "config";

/// Candidate conventional config file paths under `home`, in preference
/// order: YAML before JSON.
pub fn candidate_paths(home: &Path) -> Vec<PathBuf> {
    let dir = home.join(STATE_DIR_NAME);
    vec![
        dir.join(format!("{CONFIG_STEM}.yaml")),
        dir.join(format!("{CONFIG_STEM}.yml")),
        dir.join(format!("{CONFIG_STEM}.json")),
    ]
}

/// Pick the first existing candidate under `home` (YAML preferred).
pub fn resolve_config_path(home: &Path) -> Option<PathBuf> {
    candidate_paths(home).into_iter().find(|p| p.is_file())
}

pub struct ConfigLoader {
    home: PathBuf,
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(home: PathBuf) -> Self {
        ConfigLoader { home, explicit_path: None }
    }

    /// Load a specific file instead of searching the conventional location.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.explicit_path = Some(path);
        self
    }

    /// Run the full layered load. If no config file is found, returns the
    /// schema defaults (still resolved against `home` and created on disk).
    pub fn load(&self) -> Result<Config> {
        let path = match &self.explicit_path {
            Some(p) => Some(p.clone()),
            None => resolve_config_path(&self.home),
        };

        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                let mut document = includes::load_resolved(&path)?;
                substitution::substitute(&mut document);
                overrides::apply(&mut document);
                serde_json::from_value(document).map_err(|e| ConfigError::Validation(e.to_string()))?
            }
            None => {
                debug!(home = %self.home.display(), "no config file found, using defaults");
                let mut document = serde_json::to_value(Config::default()).expect("Config serializes");
                overrides::apply(&mut document);
                serde_json::from_value(document).map_err(|e| ConfigError::Validation(e.to_string()))?
            }
        };

        paths::resolve_and_create_dirs(&mut config, &self.home)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_defaults_when_no_file_present() {
        let home = TempDir::new().unwrap();
        let loader = ConfigLoader::new(home.path().to_path_buf());
        let config = loader.load().unwrap();
        assert_eq!(config.agent.model, "anthropic/claude-sonnet-4");
        assert!(config.memory.directory.is_dir());
    }

    #[test]
    fn prefers_yaml_over_json_when_both_exist() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join(".automate");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "agent:\n  model: from-yaml\n").unwrap();
        std::fs::write(dir.join("config.json"), r#"{"agent": {"model": "from-json"}}"#).unwrap();

        let loader = ConfigLoader::new(home.path().to_path_buf());
        let config = loader.load().unwrap();
        assert_eq!(config.agent.model, "from-yaml");
    }

    #[test]
    fn loads_json_when_only_json_present() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join(".automate");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), r#"{"agent": {"model": "json-model"}}"#).unwrap();

        let loader = ConfigLoader::new(home.path().to_path_buf());
        let config = loader.load().unwrap();
        assert_eq!(config.agent.model, "json-model");
    }

    #[test]
    fn env_override_wins_over_file_value() {
        std::env::set_var("AUTOMATE_MODEL", "env-model");
        let home = TempDir::new().unwrap();
        let dir = home.path().join(".automate");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "agent:\n  model: file-model\n").unwrap();

        let loader = ConfigLoader::new(home.path().to_path_buf());
        let config = loader.load().unwrap();
        assert_eq!(config.agent.model, "env-model");
        std::env::remove_var("AUTOMATE_MODEL");
    }

    #[test]
    fn reads_camel_case_session_and_embedding_keys() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join(".automate");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "sessions:\n  contextLimit: 20000\n  compactAt: 0.75\nmemory:\n  embedding:\n    apiBase: https://example.test/v1\n    apiKey: secret-key\n",
        )
        .unwrap();

        let loader = ConfigLoader::new(home.path().to_path_buf());
        let config = loader.load().unwrap();
        assert_eq!(config.sessions.context_limit, 20_000);
        assert_eq!(config.sessions.compact_at, 0.75);
        assert_eq!(config.memory.embedding.api_base.as_deref(), Some("https://example.test/v1"));
        assert_eq!(config.memory.embedding.api_key.as_deref(), Some("secret-key"));
    }

    #[test]
    fn unknown_top_level_group_does_not_fail_validation() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join(".automate");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "futureGroup:\n  someField: 1\n").unwrap();

        let loader = ConfigLoader::new(home.path().to_path_buf());
        // futureGroup isn't a field on Config at all, and serde_json's
        // default struct deserialization ignores unknown top-level keys,
        // so this must not error.
        assert!(loader.load().is_ok());
    }
}
