//! Shared application state

use std::sync::Arc;

use crate::repository::{CredentialStore, RunStore, TunnelRegistry, UsageTracker};

/// Handles to the process-scoped stores, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub tunnels: Arc<TunnelRegistry>,
    pub credentials: Arc<CredentialStore>,
    pub runs: Arc<RunStore>,
    pub usage: Arc<UsageTracker>,
}
