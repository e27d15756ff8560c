//! Cache Module
//!
//! Provides byte-budgeted LRU storage and its concurrent wrapper.

mod byteview;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::ByteView;
pub use lru::{EvictionCallback, LruCache};
pub use stats::{GroupStats, StatsSnapshot};
pub use store::CacheStore;

// == Byte Length ==
/// Values whose size counts against an [`LruCache`] byte budget.
pub trait ByteLen {
    fn byte_len(&self) -> usize;
}

impl ByteLen for String {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for Vec<u8> {
    fn byte_len(&self) -> usize {
        self.len()
    }
}
