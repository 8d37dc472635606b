//! API Module
//!
//! HTTP surface of the gateway. The orchestrator routes sit behind the
//! orchestrator gate; everything else that authenticates falls through to
//! the worker validation surface, so tunnel path rules apply to whatever
//! path the caller actually requested.

pub mod agents;
pub mod error;
pub mod runs;
pub mod status;
pub mod tunnels;
pub mod validate;

use axum::http::{HeaderName, Method, header};
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::state::AppState;

/// Create the main router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let orchestrator = Router::new()
        // Tunnel administration
        .route("/orchestrator/tunnels", get(tunnels::list_tunnels))
        .route("/orchestrator/tunnels/create", post(tunnels::create_tunnel))
        .route("/orchestrator/tunnels/update", post(tunnels::update_tunnel))
        .route("/orchestrator/tunnels/delete", post(tunnels::delete_tunnel))
        // Agent credentials
        .route("/orchestrator/agents", get(agents::list_agents))
        .route("/orchestrator/agents/create", post(agents::create_agent))
        .route("/orchestrator/agents/delete", post(agents::delete_agent))
        // Pipeline runs
        .route("/orchestrator/pipeline/start", post(runs::start_run))
        .route("/orchestrator/pipeline/status", get(runs::run_status))
        .route("/orchestrator/pipeline/runs", get(runs::list_runs))
        .route("/orchestrator/pipeline/reset", post(runs::reset_run))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::orchestrator_gate,
        ));

    Router::new()
        .route("/status", get(status::server_status))
        .merge(orchestrator)
        // Worker surface: any other method+path is policy-evaluated
        .fallback(validate::validate)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static(auth::API_KEY_HEADER),
            header::CONTENT_TYPE,
        ])
}
