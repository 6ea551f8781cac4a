//! API Handlers
//!
//! HTTP request handlers exposing the cache contract over JSON.
//!
//! Cache calls block on disk or network I/O, so every handler runs them on
//! tokio's blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{AnyCache, Cache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    Ack, Action, EmptyQuery, ExistsResponse, GetResponse, HealthResponse, SetRequest,
};

/// Application state shared across all handlers.
///
/// Holds the one cache backend selected at startup.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide cache handle
    pub cache: Arc<AnyCache>,
}

impl AppState {
    /// Creates a new AppState around an opened cache.
    pub fn new(cache: AnyCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens whichever backend the Config selects.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(AnyCache::from_config(config)?))
    }

    /// Runs `op` against the cache on the blocking thread pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&AnyCache) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || op(cache.as_ref()))
            .await
            .map_err(|err| CacheError::Internal(format!("cache task failed: {}", err)))?
    }
}

/// Handler for PUT /cache
///
/// Stores a JSON value under a key with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<Ack>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let SetRequest { key, value, ttl } = req;
    let stored_key = key.clone();
    state
        .blocking(move |cache| cache.set(&stored_key, &value, ttl))
        .await?;

    Ok(Json(Ack::new(Action::Stored, key)))
}

/// Handler for GET /cache/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let lookup = key.clone();
    let value: Value = state.blocking(move |cache| cache.get(&lookup)).await?;

    Ok(Json(GetResponse { key, value }))
}

/// Handler for GET /cache/:key/exists
///
/// Reports whether a live entry exists. Never fails on backend errors.
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ExistsResponse>> {
    let lookup = key.clone();
    let exists = state.blocking(move |cache| Ok(cache.has(&lookup))).await?;

    Ok(Json(ExistsResponse { key, exists }))
}

/// Handler for DELETE /cache/:key
///
/// Deletes a key from the cache. Absent keys succeed.
pub async fn forget_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Ack>> {
    let target = key.clone();
    state.blocking(move |cache| cache.forget(&target)).await?;

    Ok(Json(Ack::new(Action::Forgotten, key)))
}

/// Handler for DELETE /cache?pattern=prefix
///
/// Deletes every key starting with `pattern`; without a pattern, empties the cache.
pub async fn empty_handler(
    State(state): State<AppState>,
    Query(query): Query<EmptyQuery>,
) -> Result<Json<Ack>> {
    let pattern = query.pattern.unwrap_or_default();
    let target = pattern.clone();
    state
        .blocking(move |cache| {
            if target.is_empty() {
                cache.empty()
            } else {
                cache.empty_by_match(&target)
            }
        })
        .await?;

    Ok(Json(Ack::new(Action::Emptied, pattern)))
}

/// Handler for GET /health
///
/// Returns health status and the active backend.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        backend: state.cache.backend_name(),
    })
}
