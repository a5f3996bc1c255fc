//! Error types for configuration loading.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config as YAML: {0}")]
    Yaml(String),

    #[error("failed to parse config as JSON: {0}")]
    Json(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("no config file found at {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
