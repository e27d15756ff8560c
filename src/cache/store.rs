//! Cache Store Module
//!
//! Lock-guarded wrapper that makes [`LruCache`] safe to share between tasks.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{ByteView, GroupStats, LruCache};

// == Cache Store ==
/// Concurrent byte-budgeted cache of [`ByteView`]s.
///
/// Every operation takes one exclusive lock for memory-only work, so no
/// lookup ever waits on I/O. The underlying cache is built up front; an
/// empty [`LruCache`] owns no heap allocations, so unused groups stay cheap.
#[derive(Debug)]
pub struct CacheStore {
    lru: Mutex<LruCache<ByteView>>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store that holds at most `cache_bytes` bytes, 0 = unbounded.
    pub fn new(cache_bytes: usize) -> Self {
        Self {
            lru: Mutex::new(LruCache::new(cache_bytes)),
        }
    }

    /// Creates a store that counts its evictions into `stats`.
    pub fn with_stats(cache_bytes: usize, stats: Arc<GroupStats>) -> Self {
        let on_evicted = Box::new(move |_key: &str, _value: &ByteView| stats.record_eviction());
        Self {
            lru: Mutex::new(LruCache::with_eviction_callback(cache_bytes, on_evicted)),
        }
    }

    // == Get ==
    /// Returns the cached view for `key` and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        self.lru.lock().get(key).cloned()
    }

    // == Add ==
    /// Stores a private copy of `value` under `key`.
    pub fn add(&self, key: &str, value: &ByteView) {
        let owned = ByteView::copy_from_slice(value.as_slice());
        self.lru.lock().add(key, owned);
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.lru.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lru.lock().is_empty()
    }

    /// Bytes currently used by keys and values.
    pub fn bytes(&self) -> usize {
        self.lru.lock().bytes()
    }
}
