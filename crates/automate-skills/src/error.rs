//! Error types for skill loading.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frontmatter: {0}")]
    Frontmatter(String),
}

pub type Result<T> = std::result::Result<T, SkillError>;
