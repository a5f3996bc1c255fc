//! File-driven skill loading: `SKILL.md` directories with OS/binary/env
//! gating, directory-precedence overrides, and a change-watching loader.

pub mod error;
pub mod frontmatter;
pub mod gating;
pub mod loader;
pub mod skill;
pub mod watcher;

pub use error::{Result, SkillError};
pub use frontmatter::SkillMetadata;
pub use gating::GatingReason;
pub use loader::SkillLoader;
pub use skill::{Skill, SkippedSkill};
pub use watcher::SkillWatcher;
