//! Credential Store
//!
//! In-memory view of the credential file, keyed by opaque API key.
//! Read-mostly: lookups take a shared lock, orchestrator mutations and
//! watcher reloads take the exclusive lock.

use std::collections::HashMap;
use std::path::PathBuf;

use gatehouse_core::domain::credential::{Credential, Tier};
use tokio::sync::RwLock;

use crate::repository::file::{self, StoreError};

pub struct CredentialStore {
    path: PathBuf,
    inner: RwLock<HashMap<String, Credential>>,
}

impl CredentialStore {
    /// Load the store from disk. A missing file yields an empty store;
    /// an unreadable or corrupt file is an error (fatal at startup).
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

    /// Look up a credential by its full key
    pub async fn lookup(&self, key: &str) -> Option<Credential> {
        self.inner.read().await.get(key).cloned()
    }

    /// All credentials with their keys
    pub async fn entries(&self) -> Vec<(String, Credential)> {
        self.inner
            .read()
            .await
            .iter()
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect()
    }

    /// Count of active worker credentials
    pub async fn worker_count(&self) -> usize {
        self.inner
            .read()
            .await
            .values()
            .filter(|c| c.tier == Tier::Worker && c.active)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Insert a credential and persist synchronously
    pub async fn insert(&self, key: String, credential: Credential) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        map.insert(key, credential);
        file::write_json_atomic(&self.path, &*map)
    }

    /// Remove a credential by key and persist. Returns false if absent.
    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut map = self.inner.write().await;
        if map.remove(key).is_none() {
            return Ok(false);
        }
        file::write_json_atomic(&self.path, &*map)?;
        Ok(true)
    }

    /// Re-read the file and atomically replace the in-memory view.
    /// Returns the number of credentials loaded.
    pub async fn reload(&self) -> Result<usize, StoreError> {
        let map: HashMap<String, Credential> = file::read_json(&self.path)?;
        let count = map.len();
        *self.inner.write().await = map;
        Ok(count)
    }
}
