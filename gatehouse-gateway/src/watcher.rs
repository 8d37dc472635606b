//! Config Watcher
//!
//! Watches the data directory for out-of-band edits to the tunnel and
//! credential files and reloads them atomically. A file that fails to
//! parse is logged and the prior in-memory snapshot retained. The run and
//! usage files are written by this process and are not reloaded.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::repository::{CREDENTIALS_FILE, TUNNELS_FILE};
use crate::state::AppState;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Handle keeping the watcher thread and reload task alive
pub struct ConfigWatcher {
    stop_tx: std::sync::mpsc::Sender<()>,
    thread: Option<std::thread::JoinHandle<()>>,
}

/// Start watching `data_dir` for config edits
pub fn spawn(state: AppState, data_dir: PathBuf) -> ConfigWatcher {
    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<Vec<PathBuf>>(16);
    let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

    let thread = std::thread::spawn(move || {
        let mut watcher = match RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    ) {
                        let _ = event_tx.try_send(event.paths);
                    }
                }
                Err(err) => {
                    tracing::error!("Config watcher error: {}", err);
                }
            },
            notify::Config::default(),
        ) {
            Ok(w) => w,
            Err(err) => {
                tracing::error!("Failed to initialize config watcher: {}", err);
                return;
            }
        };

        if let Err(err) = watcher.watch(&data_dir, RecursiveMode::NonRecursive) {
            tracing::error!(
                "Failed to watch config directory {}: {}",
                data_dir.display(),
                err
            );
            return;
        }

        let _ = stop_rx.recv();
    });

    tokio::spawn(async move {
        while let Some(paths) = event_rx.recv().await {
            let mut touched = file_names(&paths);

            // Let a burst of events (editor save, temp + rename) settle
            tokio::time::sleep(DEBOUNCE).await;
            while let Ok(more) = event_rx.try_recv() {
                touched.extend(file_names(&more));
            }

            if touched.contains(TUNNELS_FILE) {
                match state.tunnels.reload().await {
                    Ok(count) => tracing::info!("Reloaded {} tunnel(s) from disk", count),
                    Err(err) => {
                        tracing::warn!("Ignoring tunnel file change, keeping prior config: {}", err)
                    }
                }
            }
            if touched.contains(CREDENTIALS_FILE) {
                match state.credentials.reload().await {
                    Ok(count) => tracing::info!("Reloaded {} credential(s) from disk", count),
                    Err(err) => tracing::warn!(
                        "Ignoring credential file change, keeping prior config: {}",
                        err
                    ),
                }
            }
        }
    });

    ConfigWatcher {
        stop_tx,
        thread: Some(thread),
    }
}

fn file_names(paths: &[PathBuf]) -> HashSet<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
