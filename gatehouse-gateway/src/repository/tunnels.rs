//! Tunnel Registry
//!
//! In-memory view of the tunnel file, keyed by tunnel name. Policy
//! evaluation takes a snapshot of a single tunnel so no lock is held
//! across body reads or disk writes.

use std::collections::HashMap;
use std::path::PathBuf;

use gatehouse_core::domain::tunnel::Tunnel;
use tokio::sync::RwLock;

use crate::repository::file::{self, StoreError};

/// Name of the read-only tunnel used for callers with no assignment
pub const DEFAULT_TUNNEL: &str = "PublicViewer";

pub struct TunnelRegistry {
    path: PathBuf,
    inner: RwLock<HashMap<String, Tunnel>>,
}

impl TunnelRegistry {
    /// Load the registry from disk. A missing file yields an empty
    /// registry; a corrupt file is an error (fatal at startup).
    pub fn load(path: PathBuf) -> Result<Self, StoreError> {
        let map = if path.exists() {
            file::read_json(&path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            inner: RwLock::new(map),
        })
    }

    /// Snapshot a single tunnel by name
    pub async fn snapshot(&self, name: &str) -> Option<Tunnel> {
        self.inner.read().await.get(name).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.inner.read().await.contains_key(name)
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn list(&self) -> Vec<Tunnel> {
        let mut tunnels: Vec<Tunnel> = self.inner.read().await.values().cloned().collect();
        tunnels.sort_by(|a, b| a.name.cmp(&b.name));
        tunnels
    }

    /// Insert or replace a tunnel and persist synchronously
    pub async fn insert(&self, tunnel: Tunnel) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        map.insert(tunnel.name.clone(), tunnel);
        file::write_json_atomic(&self.path, &*map)
    }

    /// Remove a tunnel by name and persist. Returns false if absent.
    pub async fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let mut map = self.inner.write().await;
        if map.remove(name).is_none() {
            return Ok(false);
        }
        file::write_json_atomic(&self.path, &*map)?;
        Ok(true)
    }

    /// Re-read the file and atomically replace the in-memory view.
    /// Returns the number of tunnels loaded.
    pub async fn reload(&self) -> Result<usize, StoreError> {
        let map: HashMap<String, Tunnel> = file::read_json(&self.path)?;
        let count = map.len();
        *self.inner.write().await = map;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gatehouse_core::domain::tunnel::WhitelistMode;

    fn tunnel(name: &str) -> Tunnel {
        Tunnel {
            name: name.to_string(),
            description: None,
            allowed_methods: vec!["GET".to_string()],
            allowed_paths: vec![],
            allowed_commands: vec![],
            forbidden_keywords: vec![],
            command_whitelist_mode: WhitelistMode::Strict,
            pipeline: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnels.json");

        let registry = TunnelRegistry::load(path.clone()).unwrap();
        registry.insert(tunnel("DevOps")).await.unwrap();

        let reopened = TunnelRegistry::load(path).unwrap();
        assert!(reopened.snapshot("DevOps").await.is_some());
        assert!(reopened.snapshot("Missing").await.is_none());
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_prior_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnels.json");

        let registry = TunnelRegistry::load(path.clone()).unwrap();
        registry.insert(tunnel("DevOps")).await.unwrap();

        std::fs::write(&path, b"]]").unwrap();
        assert!(registry.reload().await.is_err());
        assert!(registry.contains("DevOps").await);
    }

    #[tokio::test]
    async fn test_names_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TunnelRegistry::load(dir.path().join("tunnels.json")).unwrap();

        registry.insert(tunnel("Zeta")).await.unwrap();
        registry.insert(tunnel("Alpha")).await.unwrap();

        assert_eq!(registry.names().await, vec!["Alpha", "Zeta"]);
    }
}
