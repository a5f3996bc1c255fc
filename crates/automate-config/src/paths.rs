//! `~`-prefixed path resolution against the user home directory, plus
//! creation of the resolved data directories.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::schema::Config;

/// Expand a leading `~` or `~/...` against `home`. Paths without a leading
/// `~` are returned unchanged.
pub fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    let Ok(stripped) = path.strip_prefix("~") else { return path.to_path_buf() };
    home.join(stripped)
}

/// Resolve every `~`-prefixed directory in `config` against `home` and
/// create each resolved directory on disk.
pub fn resolve_and_create_dirs(config: &mut Config, home: &Path) -> Result<()> {
    config.memory.directory = expand_tilde(&config.memory.directory, home);
    config.memory.shared_directory = expand_tilde(&config.memory.shared_directory, home);
    config.sessions.directory = expand_tilde(&config.sessions.directory, home);
    config.skills.directory = expand_tilde(&config.skills.directory, home);
    config.skills.extra_dirs = config.skills.extra_dirs.iter().map(|d| expand_tilde(d, home)).collect();
    config.cron.directory = expand_tilde(&config.cron.directory, home);

    if let Some(plugins_dir) = config.plugins.get("directory").and_then(|v| v.as_str()) {
        let resolved = expand_tilde(Path::new(plugins_dir), home);
        if let Some(map) = config.plugins.as_object_mut() {
            map.insert("directory".to_string(), serde_json::Value::String(resolved.to_string_lossy().to_string()));
        }
        create_dir(&resolved)?;
    }

    for dir in [
        &config.memory.directory,
        &config.memory.shared_directory,
        &config.sessions.directory,
        &config.skills.directory,
        &config.cron.directory,
    ] {
        create_dir(dir)?;
    }
    for dir in &config.skills.extra_dirs {
        create_dir(dir)?;
    }

    Ok(())
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::Io { path: dir.display().to_string(), source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_leading_tilde() {
        let home = Path::new("/home/user");
        assert_eq!(expand_tilde(Path::new("~/foo/bar"), home), PathBuf::from("/home/user/foo/bar"));
    }

    #[test]
    fn leaves_non_tilde_paths_unchanged() {
        let home = Path::new("/home/user");
        assert_eq!(expand_tilde(Path::new("/abs/path"), home), PathBuf::from("/abs/path"));
    }

    #[test]
    fn resolve_and_create_dirs_creates_every_data_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let home = tmp.path();

        let mut config = Config::default();
        config.memory.directory = PathBuf::from("~/memory");
        config.memory.shared_directory = PathBuf::from("~/shared");
        config.sessions.directory = PathBuf::from("~/sessions");
        config.skills.directory = PathBuf::from("~/skills");
        config.cron.directory = PathBuf::from("~/cron");

        resolve_and_create_dirs(&mut config, home).unwrap();

        assert!(home.join("memory").is_dir());
        assert!(home.join("shared").is_dir());
        assert!(home.join("sessions").is_dir());
        assert!(home.join("skills").is_dir());
        assert!(home.join("cron").is_dir());
    }
}
