//! Cache Module
//!
//! A uniform cache contract with two interchangeable backends: an embedded sled
//! store and a pooled Redis connection. Both share the entry envelope codec.

mod contract;
pub mod embedded;
pub mod entry;
pub mod networked;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use contract::{AnyCache, Cache, MAX_TTL_SECONDS};
pub use embedded::{EmbeddedCache, PurgeReport, DELETE_BATCH_SIZE};
pub use entry::Entry;
pub use networked::NetworkedCache;
