//! Peers Module
//!
//! Capabilities a group uses to reach the node that owns a key, plus the
//! HTTP client side of the peer protocol.
//!
//! Deciding which node owns a key (consistent hashing or otherwise) is left
//! to the embedder through [`PeerPicker`].

mod client;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use client::HttpGetter;

// == Peer Picker ==
/// Routes a key to the remote peer that owns it.
pub trait PeerPicker: Send + Sync {
    /// Returns the owning peer, or `None` when the local node owns `key`
    /// or no remote peer is available.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

// == Peer Getter ==
/// Fetches a value from a remote peer's cache.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    async fn get(&self, group: &str, key: &str) -> Result<Vec<u8>>;
}
