//! Atomic JSON file I/O
//!
//! State files are rewritten in full through a temp file in the same
//! directory followed by a rename, so the watcher and a crashed process
//! only ever observe a complete old file or a complete new file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read and deserialize a JSON state file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let data = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_slice(&data).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serialize and write a JSON state file atomically (temp + rename)
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| StoreError::io(path, e))?;

    serde_json::to_writer_pretty(&mut tmp, value).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    tmp.as_file().sync_all().map_err(|e| StoreError::io(path, e))?;

    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut map = HashMap::new();
        map.insert("a".to_string(), 1u64);
        map.insert("b".to_string(), 2u64);

        write_json_atomic(&path, &map).unwrap();
        let loaded: HashMap<String, u64> = read_json(&path).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_rewrite_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        write_json_atomic(&path, &vec![4]).unwrap();

        let loaded: Vec<u64> = read_json(&path).unwrap();
        assert_eq!(loaded, vec![4]);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"not json").unwrap();

        let result: Result<Vec<u64>, _> = read_json(&path);
        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }
}
