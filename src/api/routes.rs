//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_handler, decr_handler, delete_handler, flush_handler, get_handler, get_multi_handler,
    health_handler, incr_handler, replace_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set`, `PUT /add`, `PUT /replace` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a value by key
/// - `POST /get` - Retrieve several keys
/// - `POST /incr/:key`, `POST /decr/:key` - Adjust a counter
/// - `DELETE /del/:key` - Delete a key, or expire it later with `?ttl=`
/// - `POST /flush_all` - Remove every key
/// - `GET /stats` - Row counts
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/set", put(set_handler))
        .route("/add", put(add_handler))
        .route("/replace", put(replace_handler))
        .route("/get", post(get_multi_handler))
        .route("/get/:key", get(get_handler))
        .route("/incr/:key", post(incr_handler))
        .route("/decr/:key", post(decr_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/flush_all", post(flush_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
