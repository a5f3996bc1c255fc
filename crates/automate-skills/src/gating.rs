//! OS / binary / environment-variable gating, evaluated once per load.

use std::collections::HashMap;
use std::env;

use crate::frontmatter::SkillMetadata;

/// Why a skill was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatingReason {
    UnsupportedOs { current: String, supported: Vec<String> },
    MissingBins(Vec<String>),
    MissingAnyBins(Vec<String>),
    MissingEnv(Vec<String>),
}

impl std::fmt::Display for GatingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatingReason::UnsupportedOs { current, supported } => {
                write!(f, "unsupported OS {current} (supports: {})", supported.join(", "))
            }
            GatingReason::MissingBins(bins) => write!(f, "missing required binaries: {}", bins.join(", ")),
            GatingReason::MissingAnyBins(bins) => {
                write!(f, "none of the alternative binaries are present: {}", bins.join(", "))
            }
            GatingReason::MissingEnv(vars) => write!(f, "missing required env vars: {}", vars.join(", ")),
        }
    }
}

/// Caches `which` lookups for the duration of a single `LoadAll` pass so
/// skills sharing a required binary don't each re-scan `$PATH`.
#[derive(Default)]
pub struct BinaryCache {
    found: HashMap<String, bool>,
}

impl BinaryCache {
    pub fn new() -> Self {
        BinaryCache::default()
    }

    pub fn is_present(&mut self, bin: &str) -> bool {
        *self.found.entry(bin.to_string()).or_insert_with(|| which::which(bin).is_ok())
    }
}

/// Evaluate gating for `metadata`, returning `None` if the skill loads, or
/// the first reason it's skipped.
pub fn evaluate(metadata: &SkillMetadata, cache: &mut BinaryCache) -> Option<GatingReason> {
    if metadata.always {
        return None;
    }

    if !metadata.os.is_empty() {
        let current = env::consts::OS;
        let supported = metadata.os.iter().any(|os| os.eq_ignore_ascii_case(current));
        if !supported {
            return Some(GatingReason::UnsupportedOs {
                current: current.to_string(),
                supported: metadata.os.clone(),
            });
        }
    }

    if !metadata.requires_bins.is_empty() {
        let missing: Vec<String> = metadata
            .requires_bins
            .iter()
            .filter(|bin| !cache.is_present(bin))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Some(GatingReason::MissingBins(missing));
        }
    }

    if !metadata.requires_any_bins.is_empty() {
        let any_present = metadata.requires_any_bins.iter().any(|bin| cache.is_present(bin));
        if !any_present {
            return Some(GatingReason::MissingAnyBins(metadata.requires_any_bins.clone()));
        }
    }

    if !metadata.requires_env.is_empty() {
        let missing: Vec<String> = metadata
            .requires_env
            .iter()
            .filter(|var| env::var(var).is_err())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Some(GatingReason::MissingEnv(missing));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> SkillMetadata {
        SkillMetadata::default()
    }

    #[test]
    fn always_skips_all_gating() {
        let mut metadata = meta();
        metadata.always = true;
        metadata.os = vec!["plan9".to_string()];
        let mut cache = BinaryCache::new();
        assert_eq!(evaluate(&metadata, &mut cache), None);
    }

    #[test]
    fn unsupported_os_is_rejected() {
        let mut metadata = meta();
        metadata.os = vec!["plan9".to_string()];
        let mut cache = BinaryCache::new();
        assert!(matches!(evaluate(&metadata, &mut cache), Some(GatingReason::UnsupportedOs { .. })));
    }

    #[test]
    fn current_os_passes() {
        let mut metadata = meta();
        metadata.os = vec![std::env::consts::OS.to_string()];
        let mut cache = BinaryCache::new();
        assert_eq!(evaluate(&metadata, &mut cache), None);
    }

    #[test]
    fn missing_required_binary_is_rejected() {
        let mut metadata = meta();
        metadata.requires_bins = vec!["definitely-not-a-real-binary-xyz".to_string()];
        let mut cache = BinaryCache::new();
        assert!(matches!(evaluate(&metadata, &mut cache), Some(GatingReason::MissingBins(_))));
    }

    #[test]
    fn any_bins_passes_when_one_present() {
        let mut metadata = meta();
        metadata.requires_any_bins = vec!["definitely-not-a-real-binary-xyz".to_string(), "sh".to_string()];
        let mut cache = BinaryCache::new();
        assert_eq!(evaluate(&metadata, &mut cache), None);
    }

    #[test]
    fn missing_env_var_is_rejected() {
        let mut metadata = meta();
        metadata.requires_env = vec!["AUTOMATE_SKILLS_TEST_VAR_DOES_NOT_EXIST".to_string()];
        let mut cache = BinaryCache::new();
        assert!(matches!(evaluate(&metadata, &mut cache), Some(GatingReason::MissingEnv(_))));
    }

    #[test]
    fn binary_cache_reuses_lookup_result() {
        let mut cache = BinaryCache::new();
        let first = cache.is_present("sh");
        let second = cache.is_present("sh");
        assert_eq!(first, second);
        assert_eq!(cache.found.len(), 1);
    }
}
