//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Codec Error Enum ==
/// Failures while encoding or decoding an entry envelope.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Fewer bytes than the header or declared payload length require
    #[error("envelope truncated: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },

    /// Bytes do not start with the envelope magic
    #[error("envelope magic mismatch")]
    BadMagic,

    /// Envelope was written by an incompatible format version
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),

    /// Extra bytes after the declared payload
    #[error("envelope has {0} trailing bytes")]
    TrailingBytes(usize),

    /// Payload does not fit the u32 length prefix
    #[error("payload of {0} bytes exceeds envelope limit")]
    TooLarge(usize),

    /// Envelope payload does not hold exactly the requested key
    #[error("envelope does not contain key: {expected}")]
    KeyMismatch { expected: String },

    /// Value could not be serialized
    #[error("encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Payload could not be deserialized into the requested type
    #[error("decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

// == Backend Error Enum ==
/// I/O and connectivity failures reported by a storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("embedded store: {0}")]
    Embedded(#[from] sled::Error),

    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),
}

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or expired
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Stored bytes are corrupt or from an incompatible encoding
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Underlying store failed; may be transient
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Startup configuration could not be turned into a cache
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sled::Error> for CacheError {
    fn from(err: sled::Error) -> Self {
        CacheError::Backend(BackendError::Embedded(err))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(BackendError::Redis(err))
    }
}

impl From<r2d2::Error> for CacheError {
    fn from(err: r2d2::Error) -> Self {
        CacheError::Backend(BackendError::Pool(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Codec(_) | CacheError::Config(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
