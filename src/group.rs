//! Group coordination: the read-through path.
//!
//! A [`Group`] is a named cache scope tying together a loader, two bounded
//! caches and optional peer awareness. Its one public read operation walks
//! this path:
//!
//! ```text
//! Group::get(key)
//!   │
//!   ├─ primary cache hit ──────────────────────────▶ value
//!   ├─ remote/hot cache hit ───────────────────────▶ value
//!   └─ miss: coalesced load (single-flight)
//!        ├─ picker chose a peer ──▶ peer fetch ────▶ value (1/10 kept hot)
//!        │        └─ peer failed: warn, fall through
//!        └─ local loader ──▶ cache in primary ─────▶ value
//! ```
//!
//! The two caches split ownership: the **primary** cache holds values this
//! node loaded from the backend and therefore owns; the **remote/hot** cache
//! keeps a probabilistic sample (1 in 10) of values fetched from peers, so a
//! key that is hot on this node but owned elsewhere stops costing a network
//! round-trip per read, without mirroring other nodes' working sets.
//!
//! Peer failures never surface to callers as long as the local loader
//! succeeds; loader errors propagate verbatim and are never cached.

use core::fmt;

use once_cell::sync::OnceCell;
use rand::Rng;
use tracing::warn;

use crate::concurrent::ConcurrentCache;
use crate::config::GroupConfig;
use crate::error::CacheError;
use crate::metrics::{GroupStats, GroupStatsSnapshot};
use crate::node::{NodeClient, NodePicker};
use crate::singleflight::SingleFlight;
use crate::view::ByteView;

/// Loads authoritative bytes for a key on a local cache miss.
///
/// Implemented by any `Fn(&str) -> Result<Vec<u8>, CacheError>` closure, so
/// most call sites pass a closure over their backend handle:
///
/// ```
/// use peercache_rs::CacheError;
///
/// let loader = |key: &str| -> Result<Vec<u8>, CacheError> {
///     Ok(key.as_bytes().to_vec())
/// };
/// ```
///
/// Returned bytes are copied into the cache; the loader may freely reuse its
/// buffers. Report a missing key with [`CacheError::NotFound`]; it propagates
/// to the caller and nothing is cached.
pub trait Getter: Send + Sync {
    /// Fetches the authoritative value of `key` from the backend.
    fn get(&self, key: &str) -> Result<Vec<u8>, CacheError>;
}

impl<F> Getter for F
where
    F: Fn(&str) -> Result<Vec<u8>, CacheError> + Send + Sync,
{
    fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        self(key)
    }
}

/// A named read-through cache scope.
///
/// Create groups through [`new_group`](crate::new_group) or
/// [`Registry::new_group`](crate::Registry::new_group); a group lives as long
/// as its registry.
pub struct Group {
    name: String,
    getter: Box<dyn Getter>,
    cache: ConcurrentCache,
    remote_cache: ConcurrentCache,
    picker: OnceCell<Box<dyn NodePicker>>,
    loader: SingleFlight<ByteView>,
    stats: GroupStats,
}

impl Group {
    pub(crate) fn new(config: GroupConfig, getter: Box<dyn Getter>) -> Self {
        Group {
            name: config.name,
            getter,
            cache: ConcurrentCache::new(config.max_bytes),
            remote_cache: ConcurrentCache::new(config.max_bytes),
            picker: OnceCell::new(),
            loader: SingleFlight::new(),
            stats: GroupStats::default(),
        }
    }

    /// The name this group is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A point-in-time copy of the group's read-path counters.
    pub fn stats(&self) -> GroupStatsSnapshot {
        self.stats.snapshot()
    }

    /// Installs the peer-selection object.
    ///
    /// The picker is write-once: it can be attached after construction but
    /// never replaced.
    ///
    /// # Panics
    ///
    /// Panics when called a second time.
    pub fn register_picker(&self, picker: impl NodePicker + 'static) {
        if self.picker.set(Box::new(picker)).is_err() {
            panic!("picker registered twice for group {:?}", self.name);
        }
    }

    /// Returns the cached value of `key`, loading it if necessary.
    ///
    /// Checks the primary cache, then the remote/hot cache, then performs a
    /// coalesced load: at most one load per key runs at a time, and every
    /// concurrent caller for the same key shares its outcome.
    pub fn get(&self, key: &str) -> Result<ByteView, CacheError> {
        GroupStats::bump(&self.stats.gets);

        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if let Some(view) = self.cache.get(key) {
            GroupStats::bump(&self.stats.cache_hits);
            return Ok(view);
        }

        if let Some(view) = self.remote_cache.get(key) {
            GroupStats::bump(&self.stats.remote_hits);
            return Ok(view);
        }

        self.load(key)
    }

    /// Loads `key` under the coalescer, preferring the owning peer when one
    /// is registered.
    fn load(&self, key: &str) -> Result<ByteView, CacheError> {
        self.loader.run(key, || {
            GroupStats::bump(&self.stats.loads);

            if let Some(picker) = self.picker.get() {
                if let Some(client) = picker.pick_node(key) {
                    match self.load_from_peer(client.as_ref(), key) {
                        Ok(view) => return Ok(view),
                        Err(err) => {
                            GroupStats::bump(&self.stats.peer_errors);
                            warn!(
                                group = %self.name,
                                key,
                                error = %err,
                                "peer fetch failed, falling back to local load"
                            );
                        }
                    }
                }
            }

            self.load_locally(key)
        })
    }

    /// Fetches `key` from a peer. One fetched value in ten is kept in the
    /// remote/hot cache.
    fn load_from_peer(
        &self,
        client: &dyn NodeClient,
        key: &str,
    ) -> Result<ByteView, CacheError> {
        let bytes = client.get(&self.name, key)?;
        let view = ByteView::from(bytes);
        GroupStats::bump(&self.stats.peer_loads);

        if rand::thread_rng().gen_range(0..10) == 0 {
            self.remote_cache.add(key, view.clone());
        }

        Ok(view)
    }

    /// Invokes the getter and caches the result in the primary cache.
    fn load_locally(&self, key: &str) -> Result<ByteView, CacheError> {
        let bytes = match self.getter.get(key) {
            Ok(bytes) => bytes,
            Err(err) => {
                GroupStats::bump(&self.stats.load_errors);
                return Err(err);
            }
        };

        let view = ByteView::from(bytes);
        GroupStats::bump(&self.stats.local_loads);
        self.cache.add(key, view.clone());
        Ok(view)
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("cache", &self.cache)
            .field("remote_cache", &self.remote_cache)
            .field("picker", &self.picker.get().is_some())
            .finish()
    }
}
