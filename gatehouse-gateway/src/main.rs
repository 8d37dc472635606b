use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod auth;
pub mod config;
pub mod repository;
pub mod service;
pub mod state;
pub mod watcher;

use repository::{
    CREDENTIALS_FILE, CredentialStore, RUNS_FILE, RunStore, TUNNELS_FILE, TunnelRegistry,
    USAGE_FILE, UsageTracker,
};
use state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gatehouse gateway...");

    let config = config::Config::from_env();

    std::fs::create_dir_all(&config.data_dir).expect("Failed to create data directory");

    // Load persisted state; a corrupt file here is fatal
    let credentials = CredentialStore::load(config.data_dir.join(CREDENTIALS_FILE))
        .expect("Failed to load credential file");
    let tunnels =
        TunnelRegistry::load(config.data_dir.join(TUNNELS_FILE)).expect("Failed to load tunnel file");
    let runs =
        RunStore::load(config.data_dir.join(RUNS_FILE)).expect("Failed to load pipeline run file");
    let usage = UsageTracker::load(config.data_dir.join(USAGE_FILE), config.usage_flush_every)
        .expect("Failed to load usage file");

    let state = AppState {
        tunnels: Arc::new(tunnels),
        credentials: Arc::new(credentials),
        runs: Arc::new(runs),
        usage: Arc::new(usage),
    };

    service::tunnel_service::ensure_default_tunnel(&state.tunnels)
        .await
        .expect("Failed to seed default tunnel");

    if state.credentials.is_empty().await {
        let key = service::agent_service::bootstrap_orchestrator(&state.credentials)
            .await
            .expect("Failed to issue bootstrap credential");
        tracing::warn!("No credentials found; issued bootstrap orchestrator key: {}", key);
    }

    let _watcher = watcher::spawn(state.clone(), config.data_dir.clone());

    let app = api::create_router(state.clone());

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    // Flush the usage window that has not hit the persistence cadence yet
    if let Err(err) = state.usage.flush().await {
        tracing::error!("Failed to flush usage counters on shutdown: {}", err);
    }

    tracing::info!("Gateway stopped");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("Shutdown signal received");
}
