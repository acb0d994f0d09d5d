//! API Module
//!
//! HTTP handlers and routing that adapt the cache table to a JSON API.
//!
//! # Endpoints
//! - `PUT /set`, `/add`, `/replace` - Store a key-value pair
//! - `GET /get/:key`, `POST /get` - Retrieve values
//! - `POST /incr/:key`, `/decr/:key` - Adjust counters
//! - `DELETE /del/:key` - Delete a key
//! - `POST /flush_all` - Remove every key
//! - `GET /stats` - Row counts
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
