//! Error types for memory/index operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persistence error: {0}")]
    Persistence(#[from] automate_persistence::PersistenceError),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
