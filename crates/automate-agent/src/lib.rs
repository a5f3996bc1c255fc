//! Per-conversation session store, memory manager and heartbeat controller
//! for one managed agent.
//!
//! These three collaborators are deliberately independent of each other at
//! the type level (`HeartbeatController` takes a session id and an
//! `AgentCapability`-shaped closure rather than reaching into a global
//! registry); `automate-router` is what wires one of each together into a
//! `ManagedAgent`.

pub mod capability;
pub mod error;
pub mod heartbeat;
pub mod memory_manager;
pub mod session_store;

pub use capability::AgentCapability;
pub use error::{AgentError, Result};
pub use heartbeat::{HeartbeatConfig, HeartbeatController, HeartbeatEntry, HeartbeatEvent, HeartbeatStatus};
pub use memory_manager::{IdentityFile, MemoryManager, MemoryManagerConfig, SearchResult, SearchSource};
pub use session_store::{BeforeCompactHook, CompactionReport, SessionStore, SessionStoreConfig};
