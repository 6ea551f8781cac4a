//! Cache Contract Module
//!
//! The interface both storage adapters implement, plus the startup-selected
//! handle that calling code holds instead of a concrete adapter.

use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::cache::{EmbeddedCache, NetworkedCache};
use crate::config::{BackendKind, Config};
use crate::error::Result;

/// Longest TTL either backend honors; larger values are clamped to it.
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

// == Cache Trait ==
/// Operations every cache backend supports with identical observable behavior.
///
/// All methods block the calling thread on backend I/O. Implementations are
/// shared across threads and rely on the backend for per-call atomicity; flows
/// spanning several backend calls (such as scan-then-delete) are not atomic.
pub trait Cache: Send + Sync {
    /// Returns true iff a live entry exists under `key`.
    ///
    /// Lookup failures of any kind are reported as `false`, never as errors.
    fn has(&self, key: &str) -> bool;

    /// Returns the value stored under `key`.
    ///
    /// Fails with `NotFound` when the key is absent or expired, and with
    /// `Codec` when the stored bytes cannot be decoded as `V`.
    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<V>;

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// With `ttl_seconds` set, the entry becomes unreadable after that many
    /// seconds, capped at [`MAX_TTL_SECONDS`]. A TTL of zero stores nothing and
    /// removes any existing entry.
    fn set<V: Serialize + ?Sized>(&self, key: &str, value: &V, ttl_seconds: Option<u64>)
        -> Result<()>;

    /// Deletes the entry under `key`. Absent keys are not an error.
    fn forget(&self, key: &str) -> Result<()>;

    /// Deletes every entry whose key starts with `pattern`.
    ///
    /// Not transactional: on error, entries removed so far stay removed.
    fn empty_by_match(&self, pattern: &str) -> Result<()>;

    /// Deletes every entry owned by this cache.
    fn empty(&self) -> Result<()> {
        self.empty_by_match("")
    }
}

// == Any Cache ==
/// The active backend, chosen once from configuration.
#[derive(Clone)]
pub enum AnyCache {
    Embedded(EmbeddedCache),
    Networked(NetworkedCache),
}

impl AnyCache {
    // == Constructor ==
    /// Opens the backend selected by `config.backend`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = match config.backend {
            BackendKind::Embedded => {
                AnyCache::Embedded(EmbeddedCache::open(&config.cache_dir)?)
            }
            BackendKind::Networked => AnyCache::Networked(NetworkedCache::connect(config)?),
        };
        info!("Cache backend ready: {}", cache.backend_name());
        Ok(cache)
    }

    /// Short backend name for logs and health output.
    pub fn backend_name(&self) -> &'static str {
        match self {
            AnyCache::Embedded(_) => "embedded",
            AnyCache::Networked(_) => "redis",
        }
    }

    /// The embedded adapter, if that is the active backend.
    pub fn as_embedded(&self) -> Option<&EmbeddedCache> {
        match self {
            AnyCache::Embedded(cache) => Some(cache),
            AnyCache::Networked(_) => None,
        }
    }
}

impl Cache for AnyCache {
    fn has(&self, key: &str) -> bool {
        match self {
            AnyCache::Embedded(cache) => cache.has(key),
            AnyCache::Networked(cache) => cache.has(key),
        }
    }

    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<V> {
        match self {
            AnyCache::Embedded(cache) => cache.get(key),
            AnyCache::Networked(cache) => cache.get(key),
        }
    }

    fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        match self {
            AnyCache::Embedded(cache) => cache.set(key, value, ttl_seconds),
            AnyCache::Networked(cache) => cache.set(key, value, ttl_seconds),
        }
    }

    fn forget(&self, key: &str) -> Result<()> {
        match self {
            AnyCache::Embedded(cache) => cache.forget(key),
            AnyCache::Networked(cache) => cache.forget(key),
        }
    }

    fn empty_by_match(&self, pattern: &str) -> Result<()> {
        match self {
            AnyCache::Embedded(cache) => cache.empty_by_match(pattern),
            AnyCache::Networked(cache) => cache.empty_by_match(pattern),
        }
    }
}
