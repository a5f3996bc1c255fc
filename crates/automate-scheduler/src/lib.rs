//! Persistent job store with one-shot, fixed-interval and 5-field
//! cron-expression triggers, and a single-instance 15-second tick loop.

pub mod cron;
pub mod error;
pub mod job_store;
pub mod scheduler;

pub use cron::CronSchedule;
pub use error::{Result, SchedulerError};
pub use job_store::JobStore;
pub use scheduler::{Scheduler, TriggerHandler, TICK_INTERVAL};
