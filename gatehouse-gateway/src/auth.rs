//! Authentication middleware
//!
//! Validates the `x-api-key` header, enforces the per-key daily cap, and
//! attaches the caller record to the request. Only `GET /status` and
//! `OPTIONS` bypass authentication.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use gatehouse_core::domain::credential::Tier;

use crate::api::validate;
use crate::repository::usage::RateCheck;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Authenticated caller attached to every request past the middleware
#[derive(Debug, Clone)]
pub struct Caller {
    pub key: String,
    pub name: String,
    pub tier: Tier,
    pub tunnel: Option<String>,
}

pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if req.uri().path() == "/status" && req.method() == Method::GET {
        return next.run(req).await;
    }

    let Some(key) = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        return unauthorized("Missing x-api-key header");
    };

    let Some(credential) = state.credentials.lookup(&key).await else {
        return unauthorized("Invalid API key");
    };

    if !credential.active {
        return unauthorized("API key has been revoked");
    }

    let today = Utc::now().date_naive();
    match state
        .usage
        .check_and_increment(&key, credential.daily_limit, today)
        .await
    {
        RateCheck::Limited { limit, reset } => {
            tracing::debug!("Rate limit hit for '{}'", credential.name);
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({ "error": "Daily request limit exceeded" })),
            )
                .into_response();
            let headers = response.headers_mut();
            headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(0u64));
            if let Ok(value) = HeaderValue::from_str(&reset.to_rfc3339()) {
                headers.insert(RATE_LIMIT_RESET, value);
            }
            response
        }
        RateCheck::Allowed { limit, remaining } => {
            req.extensions_mut().insert(Caller {
                key,
                name: credential.name,
                tier: credential.tier,
                tunnel: credential.tunnel,
            });
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
    }
}

/// Admission to the orchestrator routes. Orchestrator-tier callers pass
/// straight through with no policy check; anyone else is treated like any
/// other worker request and policy-evaluated against their tunnel.
pub async fn orchestrator_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match req.extensions().get::<Caller>().cloned() {
        Some(caller) if caller.tier == Tier::Orchestrator => next.run(req).await,
        Some(caller) => validate::evaluate_request(state, caller, req).await,
        None => unauthorized("Invalid API key"),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}
