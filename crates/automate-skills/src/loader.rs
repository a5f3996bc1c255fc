//! Loads skill directories from a main directory plus optional extra
//! directories, applying gating and directory precedence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Result;
use crate::gating::{self, BinaryCache};
use crate::skill::{Skill, SkippedSkill};

struct LoadedState {
    skills: HashMap<String, Skill>,
    skipped: Vec<SkippedSkill>,
    /// order skills were last loaded in, for stable injection ordering.
    order: Vec<String>,
}

/// Loads and caches skills from one main directory plus extra directories.
///
/// Directory precedence: extra directories load first (in the order given),
/// the main directory loads last, and a later load of a same-named skill
/// directory overrides an earlier one.
pub struct SkillLoader {
    main_dir: PathBuf,
    extra_dirs: Vec<PathBuf>,
    state: RwLock<LoadedState>,
}

fn skill_subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else { return Vec::new() };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

impl SkillLoader {
    pub fn new(main_dir: impl Into<PathBuf>, extra_dirs: Vec<PathBuf>) -> Self {
        SkillLoader {
            main_dir: main_dir.into(),
            extra_dirs,
            state: RwLock::new(LoadedState { skills: HashMap::new(), skipped: Vec::new(), order: Vec::new() }),
        }
    }

    /// Load every skill across extra dirs (first) then the main dir (last),
    /// overriding same-named skills with the later load. Returns loaded skills.
    pub async fn load_all(&self) -> Result<Vec<Skill>> {
        let mut skills: HashMap<String, Skill> = HashMap::new();
        let mut skipped: Vec<SkippedSkill> = Vec::new();
        let mut order: Vec<String> = Vec::new();
        let mut cache = BinaryCache::new();

        let mut dirs: Vec<&Path> = self.extra_dirs.iter().map(|p| p.as_path()).collect();
        dirs.push(self.main_dir.as_path());

        for base in dirs {
            for skill_dir in skill_subdirs(base) {
                let loaded = match Skill::load_from_dir(&skill_dir) {
                    Ok(Some((skill, _mtime))) => skill,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(dir = %skill_dir.display(), error = %e, "failed to load skill, skipping");
                        continue;
                    }
                };

                if let Some(reason) = gating::evaluate(&loaded.metadata, &mut cache) {
                    skipped.retain(|s| s.name != loaded.name);
                    skipped.push(SkippedSkill { name: loaded.name.clone(), dir: skill_dir.clone(), reason });
                    skills.remove(&loaded.name);
                    continue;
                }

                if !order.contains(&loaded.name) {
                    order.push(loaded.name.clone());
                }
                skipped.retain(|s| s.name != loaded.name);
                skills.insert(loaded.name.clone(), loaded);
            }
        }

        let result: Vec<Skill> = order.iter().filter_map(|name| skills.get(name).cloned()).collect();

        let mut state = self.state.write().await;
        state.skills = skills;
        state.skipped = skipped;
        state.order = order;

        Ok(result)
    }

    pub async fn list_skills(&self) -> Vec<Skill> {
        let state = self.state.read().await;
        state.order.iter().filter_map(|name| state.skills.get(name).cloned()).collect()
    }

    pub async fn list_skipped_skills(&self) -> Vec<SkippedSkill> {
        self.state.read().await.skipped.clone()
    }

    /// Concatenated, rendered sections of every loaded skill under a
    /// top-level `# Active Skills` header. Empty string when nothing loaded.
    pub async fn get_system_prompt_injection(&self) -> String {
        let state = self.state.read().await;
        let sections: Vec<String> =
            state.order.iter().filter_map(|name| state.skills.get(name)).map(|s| s.render_section()).collect();
        if sections.is_empty() {
            return String::new();
        }
        format!("# Active Skills\n\n{}", sections.join("\n\n"))
    }

    /// Latest mtime across every `SKILL.md` currently tracked (loaded or
    /// skipped directories are re-scanned fresh; used by the watcher).
    pub fn latest_mtime(&self) -> SystemTime {
        let mut dirs: Vec<&Path> = self.extra_dirs.iter().map(|p| p.as_path()).collect();
        dirs.push(self.main_dir.as_path());

        let mut latest = SystemTime::UNIX_EPOCH;
        for base in dirs {
            for skill_dir in skill_subdirs(base) {
                let skill_md = skill_dir.join("SKILL.md");
                if let Ok(meta) = std::fs::metadata(&skill_md) {
                    if let Ok(modified) = meta.modified() {
                        if modified > latest {
                            latest = modified;
                        }
                    }
                }
            }
        }
        latest
    }
}
