//! Gateway configuration
//!
//! All parameters come from environment variables with sensible defaults,
//! so a bare `gatehouse-gateway` starts a working local instance.

use std::path::PathBuf;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Directory holding the credential, tunnel, run, and usage files
    pub data_dir: PathBuf,

    /// Persist usage counters every this many increments per key
    pub usage_flush_every: u32,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Recognized variables:
    /// - GATEHOUSE_BIND_ADDR (default: 0.0.0.0:8080)
    /// - GATEHOUSE_DATA_DIR (default: ./data)
    /// - GATEHOUSE_USAGE_FLUSH (default: 100)
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("GATEHOUSE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("GATEHOUSE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let usage_flush_every = std::env::var("GATEHOUSE_USAGE_FLUSH")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(100);

        Self {
            bind_addr,
            data_dir,
            usage_flush_every,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            data_dir: PathBuf::from("./data"),
            usage_flush_every: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.usage_flush_every, 100);
    }
}
