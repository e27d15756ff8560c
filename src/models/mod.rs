//! Response models for the diagnostic endpoints
//!
//! The peer protocol itself carries raw bytes; only the diagnostic endpoints
//! serialise JSON bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::{HealthResponse, StatsResponse};
