//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;

/// Default path prefix of the peer protocol.
pub const DEFAULT_BASE_PATH: &str = "/_geecache";

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Path prefix under which peers are served
    pub base_path: String,
    /// Byte capacity of the demo group, 0 = unbounded
    pub cache_bytes: usize,
    /// Name of the demo group served by the binary
    pub group_name: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8001)
    /// - `BASE_PATH` - Peer protocol prefix (default: `/_geecache`)
    /// - `CACHE_BYTES` - Demo group capacity in bytes (default: 2048)
    /// - `GROUP_NAME` - Demo group name (default: `scores`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            base_path: env::var("BASE_PATH")
                .ok()
                .map(|v| normalize_base_path(&v))
                .unwrap_or(defaults.base_path),
            cache_bytes: env::var("CACHE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_bytes),
            group_name: env::var("GROUP_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.group_name),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8001,
            base_path: DEFAULT_BASE_PATH.to_string(),
            cache_bytes: 2 << 10,
            group_name: "scores".to_string(),
        }
    }
}

/// Forces a leading `/` and strips trailing ones.
///
/// An empty or all-slash input falls back to [`DEFAULT_BASE_PATH`].
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_BASE_PATH.to_string();
    }
    format!("/{}", trimmed)
}
