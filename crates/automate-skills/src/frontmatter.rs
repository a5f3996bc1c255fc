//! Parsing of `SKILL.md`'s optional frontmatter block.
//!
//! The block is YAML-ish: either a new-style nested `metadata:` mapping, or
//! a legacy flat shape (`requires_bins: a,b`, `requires_env: X`, `os:
//! ...`) that gets translated into the same [`SkillMetadata`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillMetadata {
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// Skip gating entirely when true.
    #[serde(default)]
    pub always: bool,
    #[serde(default)]
    pub os: Vec<String>,
    #[serde(default)]
    pub requires_bins: Vec<String>,
    #[serde(default)]
    pub requires_any_bins: Vec<String>,
    #[serde(default)]
    pub requires_env: Vec<String>,
    #[serde(default)]
    pub install: Option<String>,
}

fn line_starts(s: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    s.split_inclusive('\n').map(move |chunk| {
        let start = offset;
        offset += chunk.len();
        let line = chunk.strip_suffix('\n').unwrap_or(chunk);
        let line = line.strip_suffix('\r').unwrap_or(line);
        (start, line)
    })
}

/// Split `SKILL.md` content into `(frontmatter_yaml, body)`. Returns
/// `(None, content)` if there's no `---`-delimited block at the very start.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let mut lines = line_starts(content);
    let Some((_, first_line)) = lines.next() else { return (None, content) };
    if first_line.trim() != "---" {
        return (None, content);
    }
    let yaml_start = first_line.len() + 1;

    for (line_start, line) in lines {
        if line.trim() == "---" {
            let yaml = &content[yaml_start..line_start];
            let body_start = (line_start + line.len() + 1).min(content.len());
            return (Some(yaml), &content[body_start..]);
        }
    }
    (None, content)
}

/// Parse a frontmatter YAML block into [`SkillMetadata`], translating the
/// legacy flat shape if a new-style `metadata:` key isn't present.
pub fn parse_metadata(yaml: &str) -> Result<SkillMetadata> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| SkillError::Frontmatter(e.to_string()))?;

    let serde_yaml::Value::Mapping(map) = &value else {
        return Ok(SkillMetadata::default());
    };

    if let Some(metadata_value) = map.get("metadata") {
        let mut metadata: SkillMetadata = serde_yaml::from_value(metadata_value.clone())
            .map_err(|e| SkillError::Frontmatter(e.to_string()))?;
        // New-style metadata nests binary/env requirements under `requires:
        // {bins, anyBins, env}` rather than flattening them; merge that in
        // on top of whatever the flat `requires_bins`/etc fields (if any
        // were also present) already captured.
        if let Some(serde_yaml::Value::Mapping(requires)) = metadata_value.get("requires") {
            if requires.get("bins").is_some() {
                metadata.requires_bins = comma_or_list(requires.get("bins"));
            }
            if requires.get("anyBins").is_some() {
                metadata.requires_any_bins = comma_or_list(requires.get("anyBins"));
            }
            if requires.get("env").is_some() {
                metadata.requires_env = comma_or_list(requires.get("env"));
            }
        }
        return Ok(metadata);
    }

    // Legacy flat frontmatter.
    let mut metadata = SkillMetadata::default();
    if let Some(v) = map.get("emoji").and_then(|v| v.as_str()) {
        metadata.emoji = Some(v.to_string());
    }
    if let Some(v) = map.get("homepage").and_then(|v| v.as_str()) {
        metadata.homepage = Some(v.to_string());
    }
    if let Some(v) = map.get("always").and_then(|v| v.as_bool()) {
        metadata.always = v;
    }
    metadata.os = comma_or_list(map.get("os"));
    metadata.requires_bins = comma_or_list(map.get("requires_bins"));
    metadata.requires_any_bins = comma_or_list(map.get("requires_any_bins"));
    metadata.requires_env = comma_or_list(map.get("requires_env"));
    if let Some(v) = map.get("install").and_then(|v| v.as_str()) {
        metadata.install = Some(v.to_string());
    }

    Ok(metadata)
}

fn comma_or_list(value: Option<&serde_yaml::Value>) -> Vec<String> {
    match value {
        Some(serde_yaml::Value::String(s)) => s.split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect(),
        Some(serde_yaml::Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|v| !v.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_frontmatter_block() {
        let content = "---\nmetadata:\n  emoji: \"🔧\"\n---\n# Body\n\ntext here\n";
        let (yaml, body) = split_frontmatter(content);
        assert!(yaml.unwrap().contains("emoji"));
        assert_eq!(body, "# Body\n\ntext here\n");
    }

    #[test]
    fn no_frontmatter_returns_whole_content_as_body() {
        let content = "# Just a skill\n\nNo frontmatter here.\n";
        let (yaml, body) = split_frontmatter(content);
        assert!(yaml.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn parses_new_style_nested_metadata() {
        let yaml = "metadata:\n  emoji: \"🔧\"\n  always: true\n  requires:\n    bins: [git]\n    anyBins: [bash, zsh]\n    env: [API_KEY]\n";
        let metadata = parse_metadata(yaml).unwrap();
        assert_eq!(metadata.emoji.as_deref(), Some("🔧"));
        assert!(metadata.always);
        assert_eq!(metadata.requires_bins, vec!["git".to_string()]);
        assert_eq!(metadata.requires_any_bins, vec!["bash".to_string(), "zsh".to_string()]);
        assert_eq!(metadata.requires_env, vec!["API_KEY".to_string()]);
    }

    #[test]
    fn parses_new_style_flattened_requirements() {
        let yaml = "metadata:\n  emoji: \"🐍\"\n  requires_bins: [python3]\n  requires_env: [API_KEY]\n";
        let metadata = parse_metadata(yaml).unwrap();
        assert_eq!(metadata.requires_bins, vec!["python3".to_string()]);
        assert_eq!(metadata.requires_env, vec!["API_KEY".to_string()]);
    }

    #[test]
    fn translates_legacy_flat_frontmatter() {
        let yaml = "requires_bins: git, cargo\nrequires_env: TOKEN\nos: linux, macos\n";
        let metadata = parse_metadata(yaml).unwrap();
        assert_eq!(metadata.requires_bins, vec!["git".to_string(), "cargo".to_string()]);
        assert_eq!(metadata.requires_env, vec!["TOKEN".to_string()]);
        assert_eq!(metadata.os, vec!["linux".to_string(), "macos".to_string()]);
    }
}
