//! Repository Module
//!
//! Persistence layer for the gateway. Each repository owns one JSON state
//! file and the in-memory view of it; every mutation rewrites the file
//! atomically before the caller sees success.

pub mod credentials;
pub mod file;
pub mod runs;
pub mod tunnels;
pub mod usage;

pub use credentials::CredentialStore;
pub use file::StoreError;
pub use runs::RunStore;
pub use tunnels::TunnelRegistry;
pub use usage::UsageTracker;

/// File names under the gateway data directory
pub const CREDENTIALS_FILE: &str = "credentials.json";
pub const TUNNELS_FILE: &str = "tunnels.json";
pub const RUNS_FILE: &str = "runs.json";
pub const USAGE_FILE: &str = "usage.json";
