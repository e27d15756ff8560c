//! Group Module
//!
//! A group is one cache namespace: a bounded local cache in front of an
//! embedder-supplied data source, optionally backed by remote peers.
//!
//! # Lookup
//! 1. Empty keys are rejected.
//! 2. A local cache hit returns immediately.
//! 3. A miss enters the group's [`SingleFlight`], so each key is loaded at
//!    most once at a time no matter how many callers are waiting.
//! 4. Inside the flight, the owning peer (if any) is asked first. A peer
//!    failure is logged and falls through to the local source.
//! 5. The local source result is copied into the cache and returned.
//!
//! Values served by a peer are not cached locally; only the owning node
//! caches what its source returns.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cache::{ByteView, CacheStore, GroupStats, StatsSnapshot};
use crate::error::{CacheError, Result};
use crate::peers::{PeerGetter, PeerPicker};
use crate::singleflight::SingleFlight;

// == Getter ==
/// Authoritative data source for a group.
///
/// Return [`CacheError::NotFound`] when the key does not exist and
/// [`CacheError::Upstream`] for any other failure.
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

// == Getter Fn ==
/// Adapts an async closure into a [`Getter`].
///
/// ```ignore
/// let getter = GetterFn::new(|key: String| async move { Ok(key.into_bytes()) });
/// ```
pub struct GetterFn<F>(F);

impl<F> GetterFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Getter for GetterFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>>> + Send,
{
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        (self.0)(key.to_owned()).await
    }
}

// == Group ==
/// Handle to a cache namespace. Cloning is cheap and shares the namespace.
#[derive(Clone)]
pub struct Group {
    inner: Arc<GroupInner>,
}

struct GroupInner {
    name: String,
    getter: Arc<dyn Getter>,
    main_cache: CacheStore,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    loader: SingleFlight<Result<ByteView>>,
    stats: Arc<GroupStats>,
}

impl Group {
    // == Constructor ==
    /// Creates a standalone group holding at most `cache_bytes` bytes.
    ///
    /// Most callers go through [`Registry::create`](crate::Registry::create)
    /// so that the group is reachable over the peer protocol.
    pub fn new(name: impl Into<String>, cache_bytes: usize, getter: Arc<dyn Getter>) -> Self {
        let stats = Arc::new(GroupStats::new());
        Self {
            inner: Arc::new(GroupInner {
                name: name.into(),
                getter,
                main_cache: CacheStore::with_stats(cache_bytes, stats.clone()),
                peers: OnceLock::new(),
                loader: SingleFlight::new(),
                stats,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // == Register Peers ==
    /// Installs the peer router. Allowed once per group.
    ///
    /// A second call fails with [`CacheError::Config`] and leaves the first
    /// router in place.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<()> {
        self.inner.peers.set(peers).map_err(|_| {
            CacheError::Config(format!(
                "peer router already registered for group '{}'",
                self.inner.name
            ))
        })?;
        info!("Registered peer router for group '{}'", self.inner.name);
        Ok(())
    }

    pub fn has_peers(&self) -> bool {
        self.inner.peers.get().is_some()
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidArgument("key is required".to_string()));
        }
        self.inner.stats.record_get();

        if let Some(view) = self.inner.main_cache.get(key) {
            self.inner.stats.record_hit();
            debug!("[{}] cache hit for '{}'", self.inner.name, key);
            return Ok(view);
        }

        self.load(key).await
    }

    // == Load ==
    /// Runs the peer/source pipeline for `key` through the single flight.
    ///
    /// The pipeline runs on its own task and holds a handle to this group
    /// until it finishes, so a caller that times out still gets the value
    /// cached for the next one.
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.inner.stats.record_load();
        let this = self.clone();
        let owned_key = key.to_owned();
        self.inner
            .loader
            .run(key, async move { this.load_uncached(&owned_key).await })
            .await
            .unwrap_or_else(|_canceled| {
                Err(CacheError::Upstream(format!(
                    "load of '{}' ended without a result",
                    key
                )))
            })
    }

    async fn load_uncached(&self, key: &str) -> Result<ByteView> {
        // A previous flight may have filled the cache since our miss.
        if let Some(view) = self.inner.main_cache.get(key) {
            self.inner.stats.record_hit();
            return Ok(view);
        }
        self.inner.stats.record_load_deduped();

        if let Some(peer) = self.inner.peers.get().and_then(|p| p.pick_peer(key)) {
            match self.get_from_peer(peer.as_ref(), key).await {
                Ok(view) => {
                    self.inner.stats.record_peer_load();
                    return Ok(view);
                }
                Err(err) => {
                    self.inner.stats.record_peer_error();
                    warn!(
                        "[{}] failed to get '{}' from peer, using local source: {}",
                        self.inner.name, key, err
                    );
                }
            }
        }

        self.get_locally(key).await
    }

    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let bytes = peer.get(&self.inner.name, key).await?;
        Ok(ByteView::new(bytes))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = match self.inner.getter.get(key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.inner.stats.record_local_load_error();
                return Err(err);
            }
        };
        self.inner.stats.record_local_load();

        // The source handed over ownership, so nobody else can alias it.
        let view = ByteView::new(bytes);
        self.populate_cache(key, &view);
        Ok(view)
    }

    fn populate_cache(&self, key: &str, view: &ByteView) {
        self.inner.main_cache.add(key, view);
    }

    // == Stats ==
    /// Snapshot of this group's counters and cache occupancy.
    pub fn stats(&self) -> StatsSnapshot {
        let cache = &self.inner.main_cache;
        self.inner.stats.snapshot(cache.len(), cache.bytes())
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.inner.name)
            .field("main_cache", &self.inner.main_cache)
            .field("has_peers", &self.has_peers())
            .field("loader", &self.inner.loader)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::future::join_all;
    use parking_lot::Mutex;

    // == Test Doubles ==
    /// Source backed by a fixed table that counts calls per key.
    struct TableGetter {
        table: HashMap<&'static str, &'static str>,
        calls: Mutex<HashMap<String, usize>>,
        delay: Duration,
    }

    impl TableGetter {
        fn scores() -> Arc<Self> {
            Self::scores_with_delay(Duration::ZERO)
        }

        fn scores_with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                table: HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]),
                calls: Mutex::new(HashMap::new()),
                delay,
            })
        }

        fn calls(&self, key: &str) -> usize {
            self.calls.lock().get(key).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Getter for TableGetter {
        async fn get(&self, key: &str) -> Result<Vec<u8>> {
            *self.calls.lock().entry(key.to_string()).or_insert(0) += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.table
                .get(key)
                .map(|v| v.as_bytes().to_vec())
                .ok_or_else(|| CacheError::NotFound(format!("{} not exist", key)))
        }
    }

    struct FakePeer {
        reply: Result<Vec<u8>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PeerGetter for FakePeer {
        async fn get(&self, _group: &str, _key: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    /// Routes every key to one peer, or to nobody.
    struct FixedPicker(Option<Arc<FakePeer>>);

    impl PeerPicker for FixedPicker {
        fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
            self.0.clone().map(|p| p as Arc<dyn PeerGetter>)
        }
    }

    fn fake_peer(reply: Result<Vec<u8>>) -> Arc<FakePeer> {
        Arc::new(FakePeer {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    // == Tests ==
    #[tokio::test]
    async fn test_get_loads_then_hits_cache() {
        let source = TableGetter::scores();
        let group = Group::new("scores", 2 << 10, source.clone());

        for _ in 0..3 {
            let view = group.get("Tom").await.unwrap();
            assert_eq!(view.to_string(), "630");
        }

        assert_eq!(source.calls("Tom"), 1);
        let stats = group.stats();
        assert_eq!(stats.gets, 3);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.local_loads, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let source = TableGetter::scores();
        let group = Group::new("scores", 0, source.clone());

        let result = group.get("").await;
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert_eq!(group.stats().gets, 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_cached() {
        let source = TableGetter::scores();
        let group = Group::new("scores", 0, source.clone());

        let result = group.get("missing-key").await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
        assert_eq!(group.stats().entries, 0);
        assert_eq!(group.stats().local_load_errors, 1);

        // A later call asks the source again.
        let _ = group.get("missing-key").await;
        assert_eq!(source.calls("missing-key"), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let source = TableGetter::scores_with_delay(Duration::from_millis(50));
        let group = Group::new("scores", 0, source.clone());

        let results = join_all((0..10).map(|_| group.get("Tom"))).await;

        assert_eq!(source.calls("Tom"), 1);
        for result in results {
            assert_eq!(result.unwrap().to_string(), "630");
        }
        let stats = group.stats();
        assert_eq!(stats.loads, 10);
        assert_eq!(stats.loads_deduped, 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_error() {
        let source = TableGetter::scores_with_delay(Duration::from_millis(20));
        let group = Group::new("scores", 0, source.clone());

        let results = join_all((0..5).map(|_| group.get("Nobody"))).await;

        assert_eq!(source.calls("Nobody"), 1);
        let first = results[0].clone();
        assert!(matches!(first, Err(CacheError::NotFound(_))));
        assert!(results.iter().all(|r| *r == first));
    }

    #[tokio::test]
    async fn test_peer_value_is_returned_but_not_cached() {
        let source = TableGetter::scores();
        let group = Group::new("scores", 0, source.clone());
        let peer = fake_peer(Ok(b"from-peer".to_vec()));
        group
            .register_peers(Arc::new(FixedPicker(Some(peer.clone()))))
            .unwrap();

        let view = group.get("Tom").await.unwrap();
        assert_eq!(view.to_string(), "from-peer");
        assert_eq!(source.calls("Tom"), 0);
        assert_eq!(group.stats().entries, 0);

        // Not cached, so the peer is asked again.
        group.get("Tom").await.unwrap();
        assert_eq!(peer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(group.stats().peer_loads, 2);
    }

    #[tokio::test]
    async fn test_peer_failure_falls_back_to_source() {
        let source = TableGetter::scores();
        let group = Group::new("scores", 0, source.clone());
        let peer = fake_peer(Err(CacheError::Peer("connection refused".to_string())));
        group
            .register_peers(Arc::new(FixedPicker(Some(peer.clone()))))
            .unwrap();

        let view = group.get("Jack").await.unwrap();
        assert_eq!(view.to_string(), "589");
        assert_eq!(source.calls("Jack"), 1);
        assert_eq!(group.stats().peer_errors, 1);
        assert_eq!(group.stats().entries, 1);

        // Source results are cached, so the peer is not consulted again.
        group.get("Jack").await.unwrap();
        assert_eq!(peer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_source_error_wins_over_peer_error() {
        let source = TableGetter::scores();
        let group = Group::new("scores", 0, source);
        let peer = fake_peer(Err(CacheError::Peer("timeout".to_string())));
        group
            .register_peers(Arc::new(FixedPicker(Some(peer))))
            .unwrap();

        let result = group.get("Nobody").await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_no_owning_peer_uses_source() {
        let source = TableGetter::scores();
        let group = Group::new("scores", 0, source.clone());
        group.register_peers(Arc::new(FixedPicker(None))).unwrap();

        assert_eq!(group.get("Sam").await.unwrap().to_string(), "567");
        assert_eq!(source.calls("Sam"), 1);
    }

    #[tokio::test]
    async fn test_second_peer_router_is_config_error() {
        let source = TableGetter::scores();
        let group = Group::new("scores", 0, source);
        let first = fake_peer(Ok(b"first".to_vec()));
        let second = fake_peer(Ok(b"second".to_vec()));

        group
            .register_peers(Arc::new(FixedPicker(Some(first))))
            .unwrap();
        let result = group.register_peers(Arc::new(FixedPicker(Some(second))));

        assert!(matches!(result, Err(CacheError::Config(_))));
        assert_eq!(group.get("Tom").await.unwrap().to_string(), "first");
    }

    #[tokio::test]
    async fn test_eviction_respects_group_budget() {
        let source = TableGetter::scores();
        // "Tom"+"630" = 6 bytes, "Jack"+"589" = 7 bytes.
        let group = Group::new("scores", 10, source.clone());

        group.get("Tom").await.unwrap();
        group.get("Jack").await.unwrap();

        let stats = group.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.evictions, 1);
        assert!(stats.bytes <= 10);

        group.get("Tom").await.unwrap();
        assert_eq!(source.calls("Tom"), 2);
    }

    #[tokio::test]
    async fn test_getter_fn_adapter() {
        let getter = GetterFn::new(|key: String| async move {
            if key == "echo" {
                Ok(key.into_bytes())
            } else {
                Err(CacheError::upstream("unsupported key"))
            }
        });
        let group = Group::new("echo", 0, Arc::new(getter));

        assert_eq!(group.get("echo").await.unwrap().to_string(), "echo");
        assert_eq!(
            group.get("other").await,
            Err(CacheError::Upstream("unsupported key".to_string()))
        );
    }

    #[tokio::test]
    async fn test_returned_bytes_do_not_alias_cache() {
        let group = Group::new("scores", 0, TableGetter::scores());

        let mut bytes = group.get("Tom").await.unwrap().byte_slice();
        bytes.copy_from_slice(b"000");

        assert_eq!(group.get("Tom").await.unwrap().to_string(), "630");
    }

    #[tokio::test]
    async fn test_caller_timeout_does_not_abandon_load() {
        let source = TableGetter::scores_with_delay(Duration::from_millis(50));
        let group = Group::new("scores", 2 << 10, source.clone());

        let first = tokio::time::timeout(Duration::from_millis(10), group.get("Tom")).await;
        assert!(first.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(group.stats().entries, 1);
        assert_eq!(group.stats().local_loads, 1);

        assert_eq!(group.get("Tom").await.unwrap().to_string(), "630");
        assert_eq!(source.calls("Tom"), 1);
    }

    #[tokio::test]
    async fn test_dropped_group_is_freed_after_abandoned_load() {
        let source = TableGetter::scores_with_delay(Duration::from_millis(50));
        let group = Group::new("scores", 2 << 10, source.clone());

        let first = tokio::time::timeout(Duration::from_millis(10), group.get("Tom")).await;
        assert!(first.is_err());
        drop(group);

        tokio::time::sleep(Duration::from_millis(300)).await;
        // Only this test still holds the source once the load has finished.
        assert_eq!(Arc::strong_count(&source), 1);
    }
}
