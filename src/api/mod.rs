//! API Module
//!
//! HTTP handlers and routing for the peer protocol.
//!
//! # Endpoints
//! - `GET {base_path}/{group}/{key}` - Raw value bytes for other nodes
//! - `GET /stats/:group` - Group statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
