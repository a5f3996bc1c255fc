//! Error types for agent routing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("no agents are registered")]
    NoAgentsRegistered,

    #[error("agent error: {0}")]
    Agent(#[from] automate_agent::AgentError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] automate_scheduler::SchedulerError),

    #[error("skill loading error: {0}")]
    Skills(#[from] automate_skills::SkillError),

    #[error("invalid channel pattern {0}: {1}")]
    InvalidPattern(String, String),
}

pub type Result<T> = std::result::Result<T, RouterError>;
