//! Agent Service
//!
//! Issues, lists, and revokes caller credentials. Keys are opaque
//! prefixed tokens (time component + v4 random) generated server-side
//! and shown in full exactly once, at issue time.

use chrono::Utc;
use gatehouse_core::domain::credential::{Credential, Tier};
use gatehouse_core::dto::agent::{AgentIssued, AgentSummary, CreateAgent};
use uuid::Uuid;

use crate::repository::file::StoreError;
use crate::repository::{CredentialStore, TunnelRegistry};

/// Service error type
#[derive(Debug)]
pub enum AgentError {
    TunnelNotFound(String),
    KeyNotFound,
    Validation(String),
    Storage(StoreError),
}

impl From<StoreError> for AgentError {
    fn from(err: StoreError) -> Self {
        AgentError::Storage(err)
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

/// Daily cap given to the bootstrap orchestrator credential. Counted like
/// any other key, just effectively unbounded.
const ORCHESTRATOR_DAILY_LIMIT: u64 = 1_000_000_000;

/// Issue a new worker credential bound to an existing tunnel
pub async fn issue_agent(
    credentials: &CredentialStore,
    tunnels: &TunnelRegistry,
    req: CreateAgent,
    created_by: &str,
) -> Result<AgentIssued> {
    if req.name.trim().is_empty() {
        return Err(AgentError::Validation(
            "Agent name cannot be empty".to_string(),
        ));
    }

    if !tunnels.contains(&req.tunnel).await {
        return Err(AgentError::TunnelNotFound(req.tunnel.clone()));
    }

    let key = generate_key("wrk");
    let credential = Credential {
        name: req.name,
        tier: Tier::Worker,
        tunnel: Some(req.tunnel),
        daily_limit: req.daily_limit,
        active: true,
        created_at: Utc::now(),
        created_by: created_by.to_string(),
    };

    credentials.insert(key.clone(), credential.clone()).await?;

    tracing::info!(
        "Issued worker credential '{}' on tunnel '{}'",
        credential.name,
        credential.tunnel.as_deref().unwrap_or_default()
    );

    Ok(AgentIssued {
        key,
        name: credential.name,
        tunnel: credential.tunnel.unwrap_or_default(),
        daily_limit: credential.daily_limit,
        created_at: credential.created_at,
    })
}

/// Revoke a credential by its full key
pub async fn revoke_agent(credentials: &CredentialStore, key: &str) -> Result<()> {
    if !credentials.remove(key).await? {
        return Err(AgentError::KeyNotFound);
    }

    tracing::info!("Revoked credential {}", redact_key(key));

    Ok(())
}

/// List worker credentials with keys redacted, ordered by name
pub async fn list_agents(credentials: &CredentialStore) -> Vec<AgentSummary> {
    let mut agents: Vec<AgentSummary> = credentials
        .entries()
        .await
        .into_iter()
        .filter(|(_, c)| c.tier == Tier::Worker)
        .map(|(key, c)| AgentSummary {
            key: redact_key(&key),
            name: c.name,
            tier: c.tier,
            tunnel: c.tunnel,
            daily_limit: c.daily_limit,
            active: c.active,
            created_at: c.created_at,
            created_by: c.created_by,
        })
        .collect();
    agents.sort_by(|a, b| a.name.cmp(&b.name));
    agents
}

/// Issue the root orchestrator credential on first boot; returns the key
pub async fn bootstrap_orchestrator(credentials: &CredentialStore) -> Result<String> {
    let key = generate_key("ork");
    credentials
        .insert(
            key.clone(),
            Credential {
                name: "root".to_string(),
                tier: Tier::Orchestrator,
                tunnel: None,
                daily_limit: ORCHESTRATOR_DAILY_LIMIT,
                active: true,
                created_at: Utc::now(),
                created_by: "bootstrap".to_string(),
            },
        )
        .await?;
    Ok(key)
}

/// Generate an opaque prefixed key: millisecond timestamp plus v4 random
pub fn generate_key(prefix: &str) -> String {
    format!(
        "{}_{:x}{}",
        prefix,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// First 8 characters of a key followed by an ellipsis
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{}...", prefix)
}
