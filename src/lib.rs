//! GeeCache - An embeddable distributed read-through cache
//!
//! Each process keeps bounded LRU caches per named group. A miss is
//! deduplicated, then served by the peer that owns the key or by the
//! group's own data source.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod group;
pub mod models;
pub mod peers;
pub mod registry;
pub mod singleflight;

pub use api::{create_router, AppState};
pub use cache::ByteView;
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{Getter, GetterFn, Group};
pub use peers::{HttpGetter, PeerGetter, PeerPicker};
pub use registry::Registry;
