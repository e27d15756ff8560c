//! Byte View Module
//!
//! Immutable snapshot of the bytes stored for one cache entry.

use std::fmt;

use bytes::Bytes;

use crate::cache::ByteLen;

// == Byte View ==
/// Read-only view over a cached value.
///
/// Cloning a view is cheap and shares the underlying buffer, which nobody
/// can mutate. Accessors that hand out owned bytes always copy.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    b: Bytes,
}

impl ByteView {
    // == Constructors ==
    /// Takes ownership of `bytes` without copying.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { b: Bytes::from(bytes) }
    }

    /// Copies `bytes` into a fresh view.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self {
            b: Bytes::copy_from_slice(bytes),
        }
    }

    // == Length ==
    /// Returns the length of the view in bytes.
    pub fn len(&self) -> usize {
        self.b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    // == Byte Slice ==
    /// Returns a copy of the data.
    pub fn byte_slice(&self) -> Vec<u8> {
        self.b.to_vec()
    }

    /// Borrows the data for reading.
    pub fn as_slice(&self) -> &[u8] {
        &self.b
    }
}

impl ByteLen for ByteView {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::copy_from_slice(s.as_bytes())
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.b))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView").field("len", &self.len()).finish()
    }
}
