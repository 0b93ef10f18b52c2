//! Mutex-guarded cache wrapper.
//!
//! Thin concurrency shell around [`LruStore`]: one exclusive lock serializes
//! every read and write, and the store itself is only allocated on the first
//! insertion so empty groups cost nothing. There is no lock-free fast path;
//! a cache busy enough for that to matter should shard at a higher level.

use core::fmt;

use parking_lot::Mutex;

use crate::lru::LruStore;
use crate::view::ByteView;

/// A thread-safe, lazily initialized byte cache.
///
/// Lookups clone the [`ByteView`] out under the lock, which copies a
/// reference count rather than the payload.
///
/// # Example
///
/// ```
/// use peercache_rs::{ByteView, ConcurrentCache};
///
/// let cache = ConcurrentCache::new(2 << 10);
/// assert!(cache.get("missing").is_none()); // nothing allocated yet
///
/// cache.add("color", ByteView::from("blue"));
/// assert_eq!(cache.get("color").map(|v| v.to_vec()), Some(b"blue".to_vec()));
/// ```
pub struct ConcurrentCache {
    max_bytes: usize,
    store: Mutex<Option<LruStore<ByteView>>>,
}

impl ConcurrentCache {
    /// Creates a cache whose store, once initialized, is bounded to
    /// `max_bytes` (0 = unbounded).
    pub fn new(max_bytes: usize) -> Self {
        ConcurrentCache {
            max_bytes,
            store: Mutex::new(None),
        }
    }

    /// Inserts `value` under `key`, creating the store on first use.
    pub fn add(&self, key: impl Into<String>, value: ByteView) {
        let mut store = self.store.lock();
        store
            .get_or_insert_with(|| LruStore::new(self.max_bytes, None))
            .add(key, value);
    }

    /// Looks up `key`. Returns `None` without allocating when the cache has
    /// never been written.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut store = self.store.lock();
        store.as_mut()?.get(key).cloned()
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.store.lock().as_ref().map_or(0, LruStore::len)
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently charged against the budget.
    pub fn used_bytes(&self) -> usize {
        self.store.lock().as_ref().map_or(0, LruStore::used_bytes)
    }
}

impl fmt::Debug for ConcurrentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.lock();
        f.debug_struct("ConcurrentCache")
            .field("max_bytes", &self.max_bytes)
            .field("initialized", &store.is_some())
            .field("len", &store.as_ref().map_or(0, LruStore::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn get_before_first_add_stays_uninitialized() {
        let cache = ConcurrentCache::new(64);
        assert!(cache.get("anything").is_none());
        assert!(cache.store.lock().is_none());
    }

    #[test]
    fn add_initializes_with_the_configured_budget() {
        let cache = ConcurrentCache::new(10);
        cache.add("a", ByteView::from("12345678"));
        cache.add("b", ByteView::from("12345678"));

        // Budget 10 only fits one 9-byte entry at a time.
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.used_bytes() <= 10);
    }

    #[test]
    fn concurrent_add_and_get_keep_the_bound() {
        let cache = Arc::new(ConcurrentCache::new(1024));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("key-{t}-{i}");
                        cache.add(key.clone(), ByteView::from("payload-bytes"));
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.used_bytes() <= 1024);
        assert!(cache.len() > 0);
    }
}
