//! Networked Store Adapter
//!
//! Cache backed by Redis through an r2d2 connection pool. Every key issued to
//! Redis is namespaced as `<prefix>:<key>` so several caches can share one
//! server without seeing each other's entries.

use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use redis::{Client, Commands, ConnectionInfo, IntoConnectionInfo};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::cache::entry;
use crate::cache::{Cache, MAX_TTL_SECONDS};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Public Constants ==
/// Page size hint passed to `SCAN`
pub const SCAN_COUNT: usize = 1_000;

/// Keys removed per `DEL` command during bulk deletion
pub const DELETE_CHUNK_SIZE: usize = 1_000;

/// How long a checkout waits for a connection
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

// == Networked Cache ==
/// Cache adapter over a pooled Redis client.
#[derive(Clone)]
pub struct NetworkedCache {
    pool: Pool<Client>,
    prefix: String,
}

impl NetworkedCache {
    // == Constructors ==
    /// Wraps an existing pool; all keys are namespaced with `prefix`.
    pub fn new(pool: Pool<Client>, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    /// Builds the pool described by `config` without opening connections yet.
    pub fn from_config(config: &Config) -> Result<Self> {
        let info = connection_info(&config.redis_host, config.redis_password.clone())?;
        let client = Client::open(info)?;

        let pool = Pool::builder()
            .max_size(config.redis_pool_size.max(1))
            .min_idle(Some(0))
            .idle_timeout(Some(Duration::from_secs(config.redis_idle_timeout)))
            .connection_timeout(CONNECTION_TIMEOUT)
            .test_on_check_out(true)
            .build_unchecked(client);

        Ok(Self::new(pool, config.redis_prefix.clone()))
    }

    /// Builds the pool and verifies the server answers `PING`.
    pub fn connect(config: &Config) -> Result<Self> {
        let cache = Self::from_config(config)?;
        cache.ping()?;
        debug!("Connected to redis at {}", config.redis_host);
        Ok(cache)
    }

    /// Round-trips a `PING` on a pooled connection.
    pub fn ping(&self) -> Result<()> {
        let mut conn = self.conn()?;
        redis::cmd("PING").query::<String>(&mut *conn)?;
        Ok(())
    }

    /// The namespace this cache owns.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Checks out a connection; it returns to the pool when dropped.
    fn conn(&self) -> Result<PooledConnection<Client>> {
        Ok(self.pool.get()?)
    }

    /// Namespaced form of a user key.
    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// `SCAN MATCH` pattern selecting namespaced keys starting with `pattern`.
    fn match_pattern(&self, pattern: &str) -> String {
        format!("{}*", escape_glob(&self.key(pattern)))
    }

    /// Collects every namespaced key starting with `pattern` via cursor scan.
    ///
    /// Keys stay raw bytes; other clients may write non-UTF-8 names.
    fn scan_keys(&self, conn: &mut redis::Connection, pattern: &str) -> Result<Vec<Vec<u8>>> {
        let glob = self.match_pattern(pattern);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, page): (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&glob)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query(&mut *conn)?;
            keys.extend(page);

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

impl Cache for NetworkedCache {
    fn has(&self, key: &str) -> bool {
        let result = self.conn().and_then(|mut conn| {
            conn.exists::<_, bool>(self.key(key))
                .map_err(CacheError::from)
        });
        match result {
            Ok(found) => found,
            Err(err) => {
                debug!("Existence check for '{}' failed: {}", key, err);
                false
            }
        }
    }

    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<V> {
        let mut conn = self.conn()?;
        let stored: Option<Vec<u8>> = conn.get(self.key(key))?;
        let bytes = stored.ok_or_else(|| CacheError::NotFound(key.to_string()))?;
        Ok(entry::decode(key, &bytes)?)
    }

    fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        let envelope = entry::encode(key, value)?;

        match ttl_seconds {
            Some(0) => self.forget(key),
            Some(ttl) => {
                let mut conn = self.conn()?;
                redis::cmd("SETEX")
                    .arg(self.key(key))
                    .arg(ttl.min(MAX_TTL_SECONDS))
                    .arg(envelope.as_slice())
                    .query::<()>(&mut *conn)?;
                Ok(())
            }
            None => {
                let mut conn = self.conn()?;
                conn.set::<_, _, ()>(self.key(key), envelope.as_slice())?;
                Ok(())
            }
        }
    }

    fn forget(&self, key: &str) -> Result<()> {
        let mut conn = self.conn()?;
        conn.del::<_, ()>(self.key(key))?;
        Ok(())
    }

    fn empty_by_match(&self, pattern: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let keys = self.scan_keys(&mut *conn, pattern)?;

        for chunk in keys.chunks(DELETE_CHUNK_SIZE) {
            conn.del::<_, ()>(chunk)?;
        }

        debug!(
            "Removed {} keys matching '{}' under prefix '{}'",
            keys.len(),
            pattern,
            self.prefix
        );
        Ok(())
    }
}

// == Helpers ==
/// Parses `host:port` plus an optional password into connection settings.
pub fn connection_info(host: &str, password: Option<String>) -> Result<ConnectionInfo> {
    let url = format!("redis://{}", host);
    let mut info = url
        .as_str()
        .into_connection_info()
        .map_err(|err| CacheError::Config(format!("invalid redis host '{}': {}", host, err)))?;
    if password.is_some() {
        info.redis.password = password;
    }
    Ok(info)
}

/// Escapes glob metacharacters so the string matches itself literally.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
