//! Atomic file operations for crash-safe persistence.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{PersistenceError, Result};

/// Writes data to a file atomically: write to a temp file in the same
/// directory, then rename over the target. The file is never observed in a
/// partially written state, even across a process crash.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::DirectoryError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut temp_file =
        tempfile::NamedTempFile::new_in(dir).map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .write_all(data)
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .flush()
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .persist(path)
        .map_err(|e| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}

/// Writes JSON data to a file atomically.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, json.as_bytes())
}

/// Reads and deserializes JSON from a file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

/// Reads JSON from a file, returning `None` if the file doesn't exist.
pub fn read_json_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

/// Reads JSON from a file, returning `None` on either a missing file or a
/// deserialization failure. The caller is expected to log and count the
/// drop; this function only classifies.
pub fn read_json_tolerant<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).ok(),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn atomic_write_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");

        atomic_write(&path, b"hello world").unwrap();

        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/test.txt");

        atomic_write(&path, b"nested content").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn atomic_write_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        atomic_write_json(&path, &data).unwrap();
        let loaded: TestData = read_json(&path).unwrap();

        assert_eq!(data, loaded);
    }

    #[test]
    fn read_json_optional_missing_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let result: Option<TestData> = read_json_optional(&path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn read_json_tolerant_handles_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, b"{not json").unwrap();

        let result: Option<TestData> = read_json_tolerant(&path);
        assert!(result.is_none());
    }

    #[test]
    fn read_json_tolerant_handles_valid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ok.json");
        let data = TestData {
            name: "ok".into(),
            value: 7,
        };
        atomic_write_json(&path, &data).unwrap();

        let result: Option<TestData> = read_json_tolerant(&path);
        assert_eq!(result, Some(data));
    }
}
