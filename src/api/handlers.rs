//! API Handlers
//!
//! HTTP handlers for the peer protocol and the diagnostic endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::config::{normalize_base_path, Config};
use crate::error::ApiError;
use crate::models::{HealthResponse, StatsResponse};
use crate::registry::Registry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Groups reachable through the peer protocol
    pub registry: Arc<Registry>,
    /// Peer protocol prefix, e.g. `/_geecache`
    pub base_path: Arc<str>,
}

impl AppState {
    /// Creates a new AppState serving `registry` under `base_path`.
    pub fn new(registry: Arc<Registry>, base_path: &str) -> Self {
        Self {
            registry,
            base_path: normalize_base_path(base_path).into(),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(registry: Arc<Registry>, config: &Config) -> Self {
        Self::new(registry, &config.base_path)
    }
}

/// Splits `{base_path}/{group}/{key}` into its percent-decoded group and key.
///
/// The remainder after the base path is split on its first `/`, so keys may
/// themselves contain `/`. Returns `None` unless both parts are non-empty.
pub fn parse_peer_path(base_path: &str, path: &str) -> Option<(String, String)> {
    let rest = path.strip_prefix(base_path)?.strip_prefix('/')?;
    let (group, key) = rest.split_once('/')?;
    if group.is_empty() || key.is_empty() {
        return None;
    }
    let group = urlencoding::decode(group).ok()?.into_owned();
    let key = urlencoding::decode(key).ok()?.into_owned();
    Some((group, key))
}

/// Whether `path` is `base_path` itself or a path below it.
fn is_under_base(base_path: &str, path: &str) -> bool {
    path.strip_prefix(base_path)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Handler for GET {base_path}/{group}/{key}
///
/// Serves the raw bytes of a value to another node. Installed as the
/// router fallback so that every path under the base path, malformed ones
/// included, gets a protocol answer.
pub async fn peer_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, ApiError> {
    let path = uri.path();
    if !is_under_base(&state.base_path, path) {
        return Err(ApiError::NoRoute(path.to_string()));
    }
    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }
    info!("{} {}", method, path);

    let (group_name, key) =
        parse_peer_path(&state.base_path, path).ok_or(ApiError::BadRequest)?;
    let group = state
        .registry
        .lookup(&group_name)
        .ok_or(ApiError::NoSuchGroup(group_name))?;

    let view = group.get(&key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        view.byte_slice(),
    )
        .into_response())
}

/// Handler for GET /stats/:group
///
/// Returns the counters of one group.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let group = state
        .registry
        .lookup(&name)
        .ok_or_else(|| ApiError::NoSuchGroup(name.clone()))?;

    Ok(Json(StatsResponse::new(name, group.stats())))
}

/// Handler for GET /health
///
/// Returns health status of the node.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
