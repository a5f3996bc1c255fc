//! Multi-agent router: dispatches inbound `(sessionId, userId)` pairs to one
//! of several isolated [`ManagedAgent`] instances by glob channel pattern and
//! `allowFrom` allow-list, falling back to the default agent when nothing
//! matches.

pub mod agent_router;
pub mod channel_pattern;
pub mod error;
pub mod managed_agent;
pub mod trigger;

pub use agent_router::{AgentRouter, CapabilityFactory};
pub use channel_pattern::matches_any;
pub use error::{Result, RouterError};
pub use managed_agent::ManagedAgent;
pub use trigger::AgentTriggerHandler;
