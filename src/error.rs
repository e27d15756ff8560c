//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache lookups and configuration.
///
/// Errors are `Clone` because a single deduplicated fetch hands the same
/// outcome to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty key, empty group name or another malformed argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown group, or the data source has no value for the key
    #[error("not found: {0}")]
    NotFound(String),

    /// The data source failed
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A remote peer could not serve the key
    #[error("peer error: {0}")]
    Peer(String),

    /// The group was misconfigured, e.g. a second peer router
    #[error("config error: {0}")]
    Config(String),
}

impl CacheError {
    /// Wraps any displayable data source failure as [`CacheError::Upstream`].
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        CacheError::Upstream(err.to_string())
    }

    /// Wraps any displayable transport failure as [`CacheError::Peer`].
    pub fn peer(err: impl std::fmt::Display) -> Self {
        CacheError::Peer(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

// == API Error Enum ==
/// Failures surfaced by the HTTP peer protocol.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Path is not `{base}/{group}/{key}`
    #[error("bad request")]
    BadRequest,

    /// Path is outside every served prefix
    #[error("no route for {0}")]
    NoRoute(String),

    /// The peer protocol only answers GET
    #[error("method not allowed")]
    MethodNotAllowed,

    /// No group registered under this name
    #[error("no such group: {0}")]
    NoSuchGroup(String),

    /// The resolved group failed to produce the value
    #[error(transparent)]
    Fetch(#[from] CacheError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NoRoute(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NoSuchGroup(_) => StatusCode::NOT_FOUND,
            ApiError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
