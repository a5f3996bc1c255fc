//! Command-line interface definition using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// automate — personal AI assistant runtime core (session store, memory
/// index, scheduler, router, heartbeat). Wires the config-driven
/// `AgentRouter` together and exposes it as a CLI / chat REPL.
#[derive(Parser, Debug)]
#[command(name = "automate", author, version, about, long_about = None)]
pub struct Cli {
    /// Override the home directory config/data is resolved against
    /// (defaults to $HOME).
    #[arg(long, env = "AUTOMATE_HOME")]
    pub home: Option<PathBuf>,

    /// Explicit config file path, bypassing the conventional
    /// `~/.automate/config.{yaml,json}` search.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enter an interactive chat REPL against the default (or named) agent.
    Chat {
        /// Route through this agent by name instead of the default.
        #[arg(short, long)]
        agent: Option<String>,
        /// Channel tag to attribute the session under (default "cli").
        #[arg(short, long, default_value = "cli")]
        channel: String,
        /// User id attributed to messages sent from this REPL.
        #[arg(short, long, default_value = "local")]
        user: String,
    },
    /// Agent router inspection and control.
    Agents {
        #[command(subcommand)]
        action: AgentsAction,
    },
    /// Semantic/lexical memory index operations.
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Scheduled job operations.
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
    /// List known sessions (summaries only, never full message logs).
    Sessions {
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// List loaded and gated-out skills.
    Skills {
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Print the resolved configuration as JSON.
    Config,
}

#[derive(Subcommand, Debug)]
pub enum AgentsAction {
    /// List every configured agent and its routing patterns.
    List,
    /// Change which agent `/agents switch` routes unmatched sessions to.
    Switch { name: String },
}

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// Re-index every identity/memory file for an agent.
    Index {
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Hybrid (vector + BM25) search over an agent's memory index.
    Search {
        query: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
        #[arg(short, long)]
        agent: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// List every job for an agent, enabled or not.
    List {
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Add a one-shot, interval, or cron job.
    Add {
        name: String,
        prompt: String,
        /// ISO-8601 instant for a one-shot job.
        #[arg(long, conflicts_with_all = ["every_ms", "cron"])]
        at: Option<String>,
        /// Fixed interval in milliseconds.
        #[arg(long, conflicts_with_all = ["at", "cron"])]
        every_ms: Option<i64>,
        /// Five-field cron expression.
        #[arg(long, conflicts_with_all = ["at", "every_ms"])]
        cron: Option<String>,
        /// Session id this job's prompt should be dispatched on.
        #[arg(long)]
        session: Option<String>,
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Remove a job by id.
    Remove {
        id: String,
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Enable a disabled job.
    Enable {
        id: String,
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Disable an enabled job without removing it.
    Disable {
        id: String,
        #[arg(short, long)]
        agent: Option<String>,
    },
}
