//! Response bodies for the cache HTTP API

use serde::Serialize;
use serde_json::Value;

/// A stored value, returned by GET /cache/:key
#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

/// Result of GET /cache/:key/exists
#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub exists: bool,
}

/// What a mutating request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Stored,
    Forgotten,
    Emptied,
}

/// Acknowledges a write or delete.
///
/// `target` is the key for single-key operations and the prefix for bulk
/// deletion (empty when the whole cache was cleared).
#[derive(Debug, Serialize)]
pub struct Ack {
    pub action: Action,
    pub target: String,
}

impl Ack {
    pub fn new(action: Action, target: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
        }
    }
}

/// Body of GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}

/// Body returned with every error status
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
