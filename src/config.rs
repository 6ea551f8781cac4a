//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Which storage engine backs the process-wide cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Local sled database directory
    Embedded,
    /// Pooled Redis connection
    Networked,
}

impl BackendKind {
    /// Parses the `CACHE` variable. Unknown names fall back to embedded.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "redis" => BackendKind::Networked,
            "embedded" | "sled" | "" => BackendKind::Embedded,
            other => {
                warn!("Unknown cache backend '{}', using embedded store", other);
                BackendKind::Embedded
            }
        }
    }
}

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected storage backend
    pub backend: BackendKind,
    /// Directory holding the embedded store's files
    pub cache_dir: PathBuf,
    /// Redis address as `host:port`
    pub redis_host: String,
    /// Optional Redis password
    pub redis_password: Option<String>,
    /// Namespace prepended to every Redis key
    pub redis_prefix: String,
    /// Maximum pooled Redis connections
    pub redis_pool_size: u32,
    /// Seconds an idle pooled connection is kept
    pub redis_idle_timeout: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Embedded store maintenance interval in seconds
    pub maintenance_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE` - `embedded` or `redis` (default: embedded)
    /// - `CACHE_DIR` - Embedded store directory (default: ./tmp/cache)
    /// - `REDIS_HOST` - Redis `host:port` (default: 127.0.0.1:6379)
    /// - `REDIS_PASSWORD` - Redis password (default: none)
    /// - `REDIS_PREFIX` - Key namespace (default: dual_cache)
    /// - `REDIS_POOL_SIZE` - Max pooled connections (default: 50)
    /// - `REDIS_IDLE_TIMEOUT` - Idle connection lifetime in seconds (default: 240)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAINTENANCE_INTERVAL` - Embedded store sweep frequency in seconds (default: 86400)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env::var("CACHE")
                .map(|v| BackendKind::parse(&v))
                .unwrap_or(defaults.backend),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
            redis_prefix: env::var("REDIS_PREFIX").unwrap_or(defaults.redis_prefix),
            redis_pool_size: env::var("REDIS_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.redis_pool_size),
            redis_idle_timeout: env::var("REDIS_IDLE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.redis_idle_timeout),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            maintenance_interval: env::var("MAINTENANCE_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.maintenance_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Embedded,
            cache_dir: PathBuf::from("./tmp/cache"),
            redis_host: "127.0.0.1:6379".to_string(),
            redis_password: None,
            redis_prefix: "dual_cache".to_string(),
            redis_pool_size: 50,
            redis_idle_timeout: 240,
            server_port: 3000,
            maintenance_interval: 86_400,
        }
    }
}
