//! API Module
//!
//! HTTP handlers and routing that expose the cache over a JSON API.
//!
//! # Endpoints
//! - `PUT /cache` - Store a key-value pair
//! - `GET /cache/:key` - Retrieve a value by key
//! - `GET /cache/:key/exists` - Check whether a key is live
//! - `DELETE /cache/:key` - Forget a key
//! - `DELETE /cache?pattern=p` - Delete every key starting with `p`
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
