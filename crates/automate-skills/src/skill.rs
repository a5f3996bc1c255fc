//! A single loaded (or skipped) skill directory.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::frontmatter::{parse_metadata, split_frontmatter, SkillMetadata};
use crate::gating::GatingReason;

#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub dir: PathBuf,
    pub metadata: SkillMetadata,
    pub body: String,
    pub references: Vec<(String, String)>,
    pub mtime: std::time::SystemTime,
}

#[derive(Debug, Clone)]
pub struct SkippedSkill {
    pub name: String,
    pub dir: PathBuf,
    pub reason: GatingReason,
}

impl Skill {
    /// Read `SKILL.md` and any `references/*.md` under `dir`. Returns
    /// `Ok(None)` if `dir` has no `SKILL.md` (not a skill directory).
    pub fn load_from_dir(dir: &Path) -> Result<Option<(Self, std::time::SystemTime)>> {
        let skill_md = dir.join("SKILL.md");
        if !skill_md.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&skill_md)?;
        let mtime = std::fs::metadata(&skill_md)?.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        let (frontmatter, body) = split_frontmatter(&content);
        let metadata = match frontmatter {
            Some(yaml) => parse_metadata(yaml)?,
            None => SkillMetadata::default(),
        };

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut references = Vec::new();
        let refs_dir = dir.join("references");
        if refs_dir.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(&refs_dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("md"))
                .collect();
            entries.sort();
            for path in entries {
                let text = std::fs::read_to_string(&path)?;
                let ref_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                references.push((ref_name, text));
            }
        }

        Ok(Some((
            Skill {
                name,
                dir: dir.to_path_buf(),
                metadata,
                body: body.to_string(),
                references,
                mtime,
            },
            mtime,
        )))
    }

    /// Render this skill's section for prompt injection.
    pub fn render_section(&self) -> String {
        let emoji = self.metadata.emoji.as_deref().unwrap_or("🔧");
        let mut section = format!("## {emoji} Skill: {}\n{}", self.name, self.body.trim());
        if !self.references.is_empty() {
            section.push_str("\n\n");
            let joined: Vec<String> = self.references.iter().map(|(_, text)| text.trim().to_string()).collect();
            section.push_str(&joined.join("\n\n"));
        }
        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn loads_skill_with_frontmatter_and_references() {
        let dir = TempDir::new().unwrap();
        let skill_dir = dir.path().join("my-skill");
        write(&skill_dir.join("SKILL.md"), "---\nmetadata:\n  emoji: \"🐍\"\n---\n# My Skill\n\nBody text.\n");
        write(&skill_dir.join("references/extra.md"), "Extra reference content.\n");

        let (skill, _mtime) = Skill::load_from_dir(&skill_dir).unwrap().unwrap();
        assert_eq!(skill.name, "my-skill");
        assert_eq!(skill.metadata.emoji.as_deref(), Some("🐍"));
        assert!(skill.body.contains("Body text."));
        assert_eq!(skill.references.len(), 1);

        let rendered = skill.render_section();
        assert!(rendered.starts_with("## 🐍 Skill: my-skill"));
        assert!(rendered.contains("Extra reference content."));
    }

    #[test]
    fn directory_without_skill_md_is_not_a_skill() {
        let dir = TempDir::new().unwrap();
        let skill_dir = dir.path().join("not-a-skill");
        std::fs::create_dir_all(&skill_dir).unwrap();
        assert!(Skill::load_from_dir(&skill_dir).unwrap().is_none());
    }

    #[test]
    fn default_emoji_used_when_none_specified() {
        let dir = TempDir::new().unwrap();
        let skill_dir = dir.path().join("plain-skill");
        write(&skill_dir.join("SKILL.md"), "# Plain\n\nNo frontmatter.\n");
        let (skill, _) = Skill::load_from_dir(&skill_dir).unwrap().unwrap();
        assert!(skill.render_section().starts_with("## 🔧 Skill: plain-skill"));
    }
}
