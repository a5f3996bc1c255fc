//! Scheduled job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved job-name prefix recognized by the external agent driver as a
/// heartbeat tick rather than user-visible text.
pub const HEARTBEAT_JOB_NAME: &str = "__heartbeat__";

/// What a firing job actually dispatches. Kept as a tagged union rather than
/// string-matching the job name, so the scheduler never needs to inspect the
/// payload to know how to route it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobKind {
    /// A plain prompt dispatched through the owning agent.
    Prompt { text: String },
    /// A heartbeat tick; `agent_name` disambiguates in multi-agent setups.
    Heartbeat { agent_name: Option<String> },
}

impl JobKind {
    /// The reserved display name this job kind is shown/persisted under.
    pub fn display_name(&self) -> String {
        match self {
            JobKind::Prompt { .. } => String::new(),
            JobKind::Heartbeat { agent_name: None } => HEARTBEAT_JOB_NAME.to_string(),
            JobKind::Heartbeat {
                agent_name: Some(name),
            } => format!("{HEARTBEAT_JOB_NAME}:{name}"),
        }
    }
}

/// A job's trigger schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Fires exactly once at `at`.
    Once { at: DateTime<Utc> },
    /// Fires every `every_ms` milliseconds.
    Interval { every_ms: i64 },
    /// Fires according to a 5-field cron expression.
    Cron { expression: String },
}

/// A scheduled task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub kind: JobKind,
    pub schedule: Schedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub run_count: u64,
}

impl Job {
    pub fn new(name: impl Into<String>, kind: JobKind, schedule: Schedule) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            schedule,
            session_id: None,
            enabled: true,
            last_run: None,
            next_run: None,
            created_at: Utc::now(),
            run_count: 0,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn is_once(&self) -> bool {
        matches!(self.schedule, Schedule::Once { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_display_name_includes_agent() {
        let k = JobKind::Heartbeat {
            agent_name: Some("coder".into()),
        };
        assert_eq!(k.display_name(), "__heartbeat__:coder");

        let k = JobKind::Heartbeat { agent_name: None };
        assert_eq!(k.display_name(), "__heartbeat__");
    }

    #[test]
    fn job_defaults_enabled_with_zero_runs() {
        let job = Job::new(
            "demo",
            JobKind::Prompt {
                text: "hi".into(),
            },
            Schedule::Interval { every_ms: 1000 },
        );
        assert!(job.enabled);
        assert_eq!(job.run_count, 0);
        assert!(job.next_run.is_none());
    }
}
