//! Gatehouse HTTP Client
//!
//! A simple, type-safe HTTP client for the Gatehouse gateway API.
//!
//! This crate provides a unified interface for the CLI and for agents to
//! talk to the gateway: the orchestrator administration surface and the
//! worker validation surface.
//!
//! # Example
//!
//! ```no_run
//! use gatehouse_client::GatehouseClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GatehouseClient::new("http://localhost:8080", "ork_mykey");
//!
//!     let status = client.status().await?;
//!     println!("Gateway knows {} tunnel(s)", status.tunnels.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod agents;
mod runs;
mod tunnels;
mod validate;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the Gatehouse gateway API
///
/// Provides methods for all gateway endpoints, organized into logical
/// groups:
/// - Tunnel administration (list, create, update, delete)
/// - Agent credentials (list, issue, revoke)
/// - Pipeline runs (start, status, list, reset)
/// - Worker validation (submit a request description for a decision)
#[derive(Debug, Clone)]
pub struct GatehouseClient {
    /// Base URL of the gateway (e.g., "http://localhost:8080")
    base_url: String,
    /// API key sent on every request
    api_key: String,
    /// HTTP client instance
    client: Client,
}

impl GatehouseClient {
    /// Create a new gateway client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the gateway (e.g., "http://localhost:8080")
    /// * `api_key` - The caller's API key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    /// Create a new gateway client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Get the base URL of the gateway
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Turn a gateway response into a typed value. Any non-2xx becomes
    /// [`ClientError::ApiError`] carrying the body (the gateway's denial
    /// and error envelopes are JSON worth surfacing verbatim).
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ClientError::ParseError(e.to_string()));
        }

        let message = response.text().await.unwrap_or_default();
        Err(ClientError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}
