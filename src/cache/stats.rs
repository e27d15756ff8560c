//! Group Statistics Module
//!
//! Tracks per-group lookup metrics: hits, loads, peer traffic and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Group Stats ==
/// Lock-free counters updated on the lookup path.
#[derive(Debug, Default)]
pub struct GroupStats {
    /// Every `Group::get` call with a non-empty key
    gets: AtomicU64,
    /// Lookups served from the local cache
    cache_hits: AtomicU64,
    /// Misses that entered the deduplicated load stage
    loads: AtomicU64,
    /// Loads that actually ran the fetch pipeline
    loads_deduped: AtomicU64,
    /// Values successfully fetched from a remote peer
    peer_loads: AtomicU64,
    /// Failed peer fetches that fell back to the local source
    peer_errors: AtomicU64,
    /// Values successfully fetched from the local source
    local_loads: AtomicU64,
    /// Failed local source fetches
    local_load_errors: AtomicU64,
    /// Entries evicted by the LRU policy
    evictions: AtomicU64,
}

impl GroupStats {
    // == Constructor ==
    /// Creates a new GroupStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_deduped(&self) {
        self.loads_deduped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_peer_load(&self) {
        self.peer_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_peer_error(&self) {
        self.peer_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_load(&self) {
        self.local_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_load_error(&self) {
        self.local_load_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters together with the current cache occupancy.
    pub fn snapshot(&self, entries: usize, bytes: usize) -> StatsSnapshot {
        StatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            loads_deduped: self.loads_deduped.load(Ordering::Relaxed),
            peer_loads: self.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
            local_loads: self.local_loads.load(Ordering::Relaxed),
            local_load_errors: self.local_load_errors.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
            bytes,
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of a group's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub gets: u64,
    pub cache_hits: u64,
    pub loads: u64,
    pub loads_deduped: u64,
    pub peer_loads: u64,
    pub peer_errors: u64,
    pub local_loads: u64,
    pub local_load_errors: u64,
    pub evictions: u64,
    /// Entries currently cached
    pub entries: usize,
    /// Bytes currently cached
    pub bytes: usize,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns cache_hits / gets, or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.gets as f64
        }
    }
}
