//! Dual Cache - a uniform cache layer over interchangeable backends
//!
//! Stores, retrieves, and bulk-invalidates serializable values under string
//! keys, backed by either an embedded sled store or a pooled Redis connection.
//! Calling code depends on [`cache::Cache`] and never on a concrete backend.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{AnyCache, Cache, EmbeddedCache, NetworkedCache, MAX_TTL_SECONDS};
pub use config::{BackendKind, Config};
pub use error::{CacheError, CodecError, Result};
pub use tasks::spawn_maintenance_task;
