//! Route table for the cache HTTP API

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    empty_handler, exists_handler, forget_handler, get_handler, health_handler, set_handler,
    AppState,
};

/// Builds the router over `state`.
///
/// `/cache` takes PUT (store) and DELETE (bulk, optional `?pattern=`);
/// `/cache/:key` takes GET and DELETE; `/cache/:key/exists` and `/health` are
/// read-only. CORS is open and every request is traced.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(set_handler).delete(empty_handler))
        .route("/cache/:key", get(get_handler).delete(forget_handler))
        .route("/cache/:key/exists", get(exists_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
