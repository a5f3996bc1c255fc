//! Crash-safe, atomic-rename file persistence for the automate runtime.
//!
//! Every on-disk document the core writes (sessions, jobs, vector index,
//! embedding cache, heartbeat log, identity files) goes through
//! [`atomic::atomic_write`] or [`atomic::atomic_write_json`] so readers never
//! observe a half-written file.

pub mod atomic;
pub mod counters;
pub mod error;

pub use atomic::{atomic_write, atomic_write_json, read_json, read_json_optional, read_json_tolerant};
pub use counters::DropCounter;
pub use error::{PersistenceError, Result};
