//! Tunnel Service
//!
//! Business logic for tunnel management.

use chrono::Utc;
use gatehouse_core::domain::tunnel::{Tunnel, WhitelistMode};
use gatehouse_core::dto::tunnel::{CreateTunnel, UpdateTunnel};

use crate::repository::TunnelRegistry;
use crate::repository::file::StoreError;
use crate::repository::tunnels::DEFAULT_TUNNEL;

/// Service error type
#[derive(Debug)]
pub enum TunnelError {
    NotFound(String),
    Validation(String),
    Storage(StoreError),
}

impl From<StoreError> for TunnelError {
    fn from(err: StoreError) -> Self {
        TunnelError::Storage(err)
    }
}

pub type Result<T> = std::result::Result<T, TunnelError>;

/// List all tunnels, ordered by name
pub async fn list_tunnels(registry: &TunnelRegistry) -> Vec<Tunnel> {
    registry.list().await
}

/// Create a new tunnel
pub async fn create_tunnel(registry: &TunnelRegistry, req: CreateTunnel) -> Result<Tunnel> {
    if req.name.trim().is_empty() {
        return Err(TunnelError::Validation(
            "Tunnel name cannot be empty".to_string(),
        ));
    }

    if registry.contains(&req.name).await {
        return Err(TunnelError::Validation(format!(
            "Tunnel '{}' already exists",
            req.name
        )));
    }

    let now = Utc::now();
    let tunnel = Tunnel {
        name: req.name,
        description: req.description,
        allowed_methods: req.allowed_methods,
        allowed_paths: req.allowed_paths,
        allowed_commands: req.allowed_commands,
        forbidden_keywords: req.forbidden_keywords,
        command_whitelist_mode: req.command_whitelist_mode,
        pipeline: req.pipeline,
        created_at: now,
        updated_at: now,
    };

    registry.insert(tunnel.clone()).await?;

    tracing::info!("Tunnel created: {}", tunnel.name);

    Ok(tunnel)
}

/// Shallow-merge update of an existing tunnel: only the supplied fields
/// change, and `updated_at` is stamped.
pub async fn update_tunnel(registry: &TunnelRegistry, req: UpdateTunnel) -> Result<Tunnel> {
    let mut tunnel = registry
        .snapshot(&req.name)
        .await
        .ok_or_else(|| TunnelError::NotFound(req.name.clone()))?;

    if let Some(description) = req.description {
        tunnel.description = Some(description);
    }
    if let Some(allowed_methods) = req.allowed_methods {
        tunnel.allowed_methods = allowed_methods;
    }
    if let Some(allowed_paths) = req.allowed_paths {
        tunnel.allowed_paths = allowed_paths;
    }
    if let Some(allowed_commands) = req.allowed_commands {
        tunnel.allowed_commands = allowed_commands;
    }
    if let Some(forbidden_keywords) = req.forbidden_keywords {
        tunnel.forbidden_keywords = forbidden_keywords;
    }
    if let Some(mode) = req.command_whitelist_mode {
        tunnel.command_whitelist_mode = mode;
    }
    if let Some(pipeline) = req.pipeline {
        tunnel.pipeline = Some(pipeline);
    }
    tunnel.updated_at = Utc::now();

    registry.insert(tunnel.clone()).await?;

    tracing::info!("Tunnel updated: {}", tunnel.name);

    Ok(tunnel)
}

/// Delete a tunnel by name
pub async fn delete_tunnel(registry: &TunnelRegistry, name: &str) -> Result<()> {
    if !registry.remove(name).await? {
        return Err(TunnelError::NotFound(name.to_string()));
    }

    tracing::info!("Tunnel deleted: {}", name);

    Ok(())
}

/// Seed the designated read-only default tunnel if it is missing
pub async fn ensure_default_tunnel(registry: &TunnelRegistry) -> Result<()> {
    if registry.contains(DEFAULT_TUNNEL).await {
        return Ok(());
    }

    let now = Utc::now();
    registry
        .insert(Tunnel {
            name: DEFAULT_TUNNEL.to_string(),
            description: Some("Read-only default for callers with no assigned tunnel".to_string()),
            allowed_methods: vec!["GET".to_string()],
            allowed_paths: vec![],
            allowed_commands: vec![],
            forbidden_keywords: vec![],
            command_whitelist_mode: WhitelistMode::Strict,
            pipeline: None,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!("Seeded default tunnel '{}'", DEFAULT_TUNNEL);

    Ok(())
}
