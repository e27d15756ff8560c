//! LRU Cache Module
//!
//! Byte-budgeted Least Recently Used store. Not safe for concurrent use on
//! its own; see [`CacheStore`](crate::cache::CacheStore) for the locked wrapper.

use std::collections::HashMap;

use crate::cache::ByteLen;

/// Callback invoked with every entry the cache evicts.
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

// == Node ==
/// One slot of the recency list. Links are indices into `LruCache::nodes`.
#[derive(Debug)]
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Cache ==
/// Byte-budgeted LRU cache with O(1) get, add and eviction.
///
/// Entries live in a slab of nodes threaded into a doubly linked list:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// An entry costs `key.len() + value.byte_len()` bytes. A `max_bytes` of 0
/// means the cache is unbounded and never evicts.
pub struct LruCache<V> {
    /// Byte budget, 0 = unbounded
    max_bytes: usize,
    /// Bytes currently accounted to live entries
    nbytes: usize,
    /// Key to slab index
    index: HashMap<String, usize>,
    /// Slab of list nodes, `None` for vacant slots
    nodes: Vec<Option<Node<V>>>,
    /// Vacant slab slots available for reuse
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: ByteLen> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_bytes` bytes.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            nbytes: 0,
            index: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            on_evicted: None,
        }
    }

    /// Creates an empty cache that reports every eviction to `on_evicted`.
    pub fn with_eviction_callback(max_bytes: usize, on_evicted: EvictionCallback<V>) -> Self {
        let mut cache = Self::new(max_bytes);
        cache.on_evicted = Some(on_evicted);
        cache
    }

    // == Get ==
    /// Looks up a key and marks it as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    // == Add ==
    /// Inserts or replaces a value, then evicts until within budget.
    ///
    /// The entry just written counts as most recently used. If it alone
    /// exceeds the budget it is evicted as well.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(&idx) = self.index.get(&key) {
            self.move_to_front(idx);
            if let Some(node) = self.nodes[idx].as_mut() {
                self.nbytes = self.nbytes - node.value.byte_len() + value.byte_len();
                node.value = value;
            }
        } else {
            self.nbytes += key.len() + value.byte_len();
            let node = Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            };
            let idx = match self.free.pop() {
                Some(idx) => {
                    self.nodes[idx] = Some(node);
                    idx
                }
                None => {
                    self.nodes.push(Some(node));
                    self.nodes.len() - 1
                }
            };
            self.push_front(idx);
            self.index.insert(key, idx);
        }

        while self.max_bytes != 0 && self.nbytes > self.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
        }
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry and returns it.
    ///
    /// The eviction callback, if any, sees the entry before it is returned.
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.free.push(idx);
        self.index.remove(&node.key);
        self.nbytes -= node.key.len() + node.value.byte_len();

        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without touching it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.tail
            .and_then(|idx| self.nodes[idx].as_ref())
            .map(|node| node.key.as_str())
    }

    // == Length ==
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently used by keys and values.
    pub fn bytes(&self) -> usize {
        self.nbytes
    }

    /// Configured budget, 0 = unbounded.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let Some(node) = self.nodes[idx].as_ref() else {
                break;
            };
            keys.push(node.key.as_str());
            cursor = node.next;
        }
        keys
    }

    // == List Plumbing ==
    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => {
                if let Some(node) = self.nodes[head].as_mut() {
                    node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.nodes[idx].as_ref().map(|n| (n.prev, n.next)) else {
            return;
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.nodes[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.nodes[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }
}

impl<V> std::fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("nbytes", &self.nbytes)
            .field("len", &self.index.len())
            .finish()
    }
}
