//! Configuration module
//!
//! Handles CLI configuration including the gateway URL and API key.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the gateway
    pub url: String,
    /// API key presented to the gateway
    pub api_key: String,
}
