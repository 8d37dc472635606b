//! Pipeline Run Store
//!
//! Owns the run state file. Run ids are allocated from a process-wide
//! counter seeded above the highest persisted id, so they stay unique and
//! monotonic across restarts. Per-run serialization is provided through
//! gate mutexes handed out by [`RunStore::gate`]: the caller holds the
//! gate across its validate+confirm sequence so two workers racing on the
//! same run are linearized.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use gatehouse_core::domain::run::{PipelineRun, RunStatus};
use tokio::sync::{Mutex, RwLock};

use crate::repository::file::{self, StoreError};

pub struct RunStore {
    path: PathBuf,
    next_id: AtomicU64,
    runs: RwLock<HashMap<u64, PipelineRun>>,
    gates: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl RunStore {
    /// Load the store from disk. A missing file yields an empty store.
    pub fn load(path: PathBuf) -> Result<Self, StoreError> {
        let runs: HashMap<u64, PipelineRun> = if path.exists() {
            file::read_json(&path)?
        } else {
            HashMap::new()
        };

        let next_id = runs.keys().max().copied().unwrap_or(0) + 1;

        Ok(Self {
            path,
            next_id: AtomicU64::new(next_id),
            runs: RwLock::new(runs),
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Create a fresh in-progress run and persist it
    pub async fn create(&self, pipeline: String, agent: String) -> Result<PipelineRun, StoreError> {
        let run_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let run = PipelineRun {
            run_id,
            pipeline,
            agent,
            started_at: Utc::now(),
            current_step: 0,
            status: RunStatus::InProgress,
            steps_completed: Vec::new(),
            completed_at: None,
            aborted_at: None,
        };

        let mut runs = self.runs.write().await;
        runs.insert(run_id, run.clone());
        file::write_json_atomic(&self.path, &*runs)?;

        Ok(run)
    }

    /// The serialization gate for a run; None if the run does not exist
    pub async fn gate(&self, run_id: u64) -> Option<Arc<Mutex<()>>> {
        if !self.runs.read().await.contains_key(&run_id) {
            return None;
        }
        let mut gates = self.gates.lock().await;
        Some(
            gates
                .entry(run_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone(),
        )
    }

    pub async fn get(&self, run_id: u64) -> Option<PipelineRun> {
        self.runs.read().await.get(&run_id).cloned()
    }

    /// All runs, ordered by id
    pub async fn list(&self) -> Vec<PipelineRun> {
        let mut runs: Vec<PipelineRun> = self.runs.read().await.values().cloned().collect();
        runs.sort_by_key(|r| r.run_id);
        runs
    }

    /// (total, completed) aggregate for the status surface
    pub async fn counts(&self) -> (usize, usize) {
        let runs = self.runs.read().await;
        let completed = runs
            .values()
            .filter(|r| r.status == RunStatus::Completed)
            .count();
        (runs.len(), completed)
    }

    /// Replace a run's state and persist synchronously. Once a run turns
    /// terminal it can never be gated again, so its gate entry is dropped
    /// here; a holder of the old gate keeps it alive through its Arc.
    pub async fn update(&self, run: PipelineRun) -> Result<(), StoreError> {
        let run_id = run.run_id;
        let terminal = run.status.is_terminal();

        {
            let mut runs = self.runs.write().await;
            runs.insert(run_id, run);
            file::write_json_atomic(&self.path, &*runs)?;
        }

        if terminal {
            self.gates.lock().await.remove(&run_id);
        }

        Ok(())
    }

    /// Drop the gate entry for a run that is gone or terminal. Covers the
    /// window where a gate was recreated after the terminal transition
    /// already pruned it.
    pub async fn prune_gate(&self, run_id: u64) {
        let prunable = self
            .runs
            .read()
            .await
            .get(&run_id)
            .map(|r| r.status.is_terminal())
            .unwrap_or(true);
        if prunable {
            self.gates.lock().await.remove(&run_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_monotonic_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.json");

        let store = RunStore::load(path.clone()).unwrap();
        let first = store.create("Deploy".into(), "bot".into()).await.unwrap();
        let second = store.create("Deploy".into(), "bot".into()).await.unwrap();
        assert!(second.run_id > first.run_id);

        let reopened = RunStore::load(path).unwrap();
        let third = reopened
            .create("Deploy".into(), "bot".into())
            .await
            .unwrap();
        assert!(third.run_id > second.run_id);
    }

    #[tokio::test]
    async fn test_update_persists_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.json");

        let store = RunStore::load(path.clone()).unwrap();
        let mut run = store.create("Deploy".into(), "bot".into()).await.unwrap();

        run.status = RunStatus::Aborted;
        run.aborted_at = Some(Utc::now());
        store.update(run.clone()).await.unwrap();

        let reopened = RunStore::load(path).unwrap();
        let loaded = reopened.get(run.run_id).await.unwrap();
        assert_eq!(loaded.status, RunStatus::Aborted);
        assert!(loaded.aborted_at.is_some());
    }

    #[tokio::test]
    async fn test_gate_absent_for_unknown_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::load(dir.path().join("runs.json")).unwrap();
        assert!(store.gate(99).await.is_none());
    }

    #[tokio::test]
    async fn test_gate_dropped_when_run_turns_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::load(dir.path().join("runs.json")).unwrap();

        let mut run = store.create("Deploy".into(), "bot".into()).await.unwrap();
        store.gate(run.run_id).await.unwrap();
        assert_eq!(store.gates.lock().await.len(), 1);

        run.status = RunStatus::Completed;
        run.completed_at = Some(Utc::now());
        store.update(run).await.unwrap();

        assert!(store.gates.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_prune_gate_keeps_live_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::load(dir.path().join("runs.json")).unwrap();

        let run = store.create("Deploy".into(), "bot".into()).await.unwrap();
        store.gate(run.run_id).await.unwrap();

        // In-progress runs keep their gate; unknown ids are swept
        store.prune_gate(run.run_id).await;
        assert_eq!(store.gates.lock().await.len(), 1);

        store.gate(run.run_id).await.unwrap();
        store.gates.lock().await.insert(99, Arc::new(Mutex::new(())));
        store.prune_gate(99).await;
        assert!(!store.gates.lock().await.contains_key(&99));
    }

    #[tokio::test]
    async fn test_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::load(dir.path().join("runs.json")).unwrap();

        let mut run = store.create("Deploy".into(), "bot".into()).await.unwrap();
        store.create("Deploy".into(), "bot".into()).await.unwrap();

        run.status = RunStatus::Completed;
        store.update(run).await.unwrap();

        assert_eq!(store.counts().await, (2, 1));
    }
}
