//! HTTP Peer Client
//!
//! [`PeerGetter`] that speaks the peer protocol over HTTP.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::peers::PeerGetter;

// == HTTP Getter ==
/// Fetches values from one remote node.
///
/// `base_url` is the node's address joined with its base path, for example
/// `http://10.0.0.2:8001/_geecache`.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGetter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Shares an existing connection pool between getters.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds `{base_url}/{group}/{key}` with both segments percent-encoded.
    pub fn url_for(&self, group: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, group: &str, key: &str) -> Result<Vec<u8>> {
        let url = self.url_for(group, key);
        debug!("fetching {} from peer", url);

        let response = self.client.get(&url).send().await.map_err(CacheError::peer)?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CacheError::Peer(format!(
                "peer returned {}: {}",
                status,
                body.trim()
            )));
        }

        let bytes = response.bytes().await.map_err(CacheError::peer)?;
        Ok(bytes.to_vec())
    }
}
