//! Core data models shared across the automate runtime.
//!
//! These types carry no behavior beyond small constructors and invariants;
//! the stores and managers in `automate-agent`, `automate-memory`, and
//! `automate-scheduler` own the operations over them.

pub mod agent_profile;
pub mod chunk;
pub mod job;
pub mod session;

pub use agent_profile::AgentProfile;
pub use chunk::Chunk;
pub use job::{Job, JobKind, Schedule, HEARTBEAT_JOB_NAME};
pub use session::{Message, MessageRole, Session, SessionSummary, ToolCall};
