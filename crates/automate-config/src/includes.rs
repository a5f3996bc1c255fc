//! `_includes` directive resolution: a string or list of paths whose
//! contents are deep-merged under the current file, with the current file
//! winning on key conflicts. Each include path is tracked across the whole
//! resolution pass; a revisited path is warned about and skipped rather
//! than recursed into again.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::merge::deep_merge;

fn parse_content(path: &Path, content: &str) -> Result<Value> {
    let is_json = path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("json")).unwrap_or(false);
    if is_json {
        serde_json::from_str(content).map_err(|e| ConfigError::Json(e.to_string()))
    } else {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Yaml(e.to_string()))
    }
}

fn include_paths(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect(),
        _ => Vec::new(),
    }
}

/// Load `path`, recursively resolving `_includes`, and return the merged
/// document.
pub fn load_resolved(path: &Path) -> Result<Value> {
    let mut seen = HashSet::new();
    resolve(path, &mut seen)
}

fn resolve(path: &Path, seen: &mut HashSet<PathBuf>) -> Result<Value> {
    let canonical = path.canonicalize().map_err(|e| ConfigError::Io { path: path.display().to_string(), source: e })?;
    if seen.contains(&canonical) {
        warn!(path = %path.display(), "config include cycle detected, skipping revisit");
        return Ok(Value::Object(serde_json::Map::new()));
    }
    seen.insert(canonical);

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io { path: path.display().to_string(), source: e })?;
    let mut value = parse_content(path, &content)?;

    let Value::Object(map) = &mut value else {
        return Ok(value);
    };

    let Some(includes_value) = map.remove("_includes") else {
        return Ok(value);
    };

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut merged = Value::Object(serde_json::Map::new());
    for include in include_paths(&includes_value) {
        let include_path = resolve_include_path(base_dir, &include);
        match resolve(&include_path, seen) {
            Ok(included) => deep_merge(&mut merged, included),
            Err(e) => {
                warn!(path = %include_path.display(), error = %e, "failed to resolve config include, skipping");
            }
        }
    }

    deep_merge(&mut merged, value);
    Ok(merged)
}

fn resolve_include_path(base_dir: &Path, include: &str) -> PathBuf {
    let candidate = PathBuf::from(include);
    if candidate.is_absolute() {
        candidate
    } else {
        base_dir.join(candidate)
    }
}
