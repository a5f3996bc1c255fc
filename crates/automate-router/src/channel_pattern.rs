//! Glob-style channel pattern matching (`*`/`?`), anchored on both ends.

use regex::Regex;

use crate::error::{Result, RouterError};

/// Compile a channel pattern into an anchored regex. `*` matches any run of
/// characters, `?` matches exactly one. The literal pattern `*` is treated
/// as a wildcard match-everything rather than being compiled at all.
pub fn compile(pattern: &str) -> Result<Regex> {
    if pattern == "*" {
        return Regex::new(".*").map_err(|e| RouterError::InvalidPattern(pattern.to_string(), e.to_string()));
    }

    let mut regex_src = String::with_capacity(pattern.len() + 2);
    regex_src.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => regex_src.push_str(".*"),
            '?' => regex_src.push('.'),
            other => regex_src.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex_src.push('$');

    Regex::new(&regex_src).map_err(|e| RouterError::InvalidPattern(pattern.to_string(), e.to_string()))
}

/// True if `session_id` matches any of `patterns`.
pub fn matches_any(patterns: &[String], session_id: &str) -> bool {
    patterns.iter().any(|p| {
        if p == "*" {
            return true;
        }
        compile(p).map(|re| re.is_match(session_id)).unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_everything() {
        assert!(matches_any(&["*".to_string()], "any-channel:123"));
    }

    #[test]
    fn literal_pattern_requires_exact_match() {
        assert!(matches_any(&["discord:general".to_string()], "discord:general"));
        assert!(!matches_any(&["discord:general".to_string()], "discord:general-extra"));
    }

    #[test]
    fn star_wildcard_matches_substrings() {
        assert!(matches_any(&["discord:*".to_string()], "discord:general"));
        assert!(!matches_any(&["discord:*".to_string()], "telegram:general"));
    }

    #[test]
    fn question_mark_matches_exactly_one_char() {
        assert!(matches_any(&["user-?".to_string()], "user-1"));
        assert!(!matches_any(&["user-?".to_string()], "user-12"));
    }

    #[test]
    fn regex_metacharacters_in_pattern_are_escaped() {
        assert!(matches_any(&["a.b".to_string()], "a.b"));
        assert!(!matches_any(&["a.b".to_string()], "aXb"));
    }
}
