//! Error types for scheduling operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] automate_persistence::PersistenceError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
