//! Byte-bounded Least Recently Used store.
//!
//! The store keeps entries ordered by access recency and charges each entry
//! `key length + value length` bytes against a configurable budget. When an
//! insertion pushes usage past the budget, entries are evicted strictly
//! oldest-unaccessed first until usage fits again.
//!
//! # Data structure
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         LruStore                              │
//! │                                                               │
//! │  HashMap<String, *Node>        Doubly linked recency list     │
//! │  ┌──────────────┐             ┌─────────────────────────────┐ │
//! │  │ "apple"  ────────────────▶ │ MRU ◀──▶ ... ◀──▶ LRU      │ │
//! │  │ "banana" ────────────────▶ │  ▲                  │       │ │
//! │  │ "cherry" ────────────────▶ │  │                  ▼       │ │
//! │  └──────────────┘             │ head             tail       │ │
//! │                               └─────────────────────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Operation | Action | Time |
//! |-----------|--------|------|
//! | `get` | Move node to the MRU position | O(1) |
//! | `add` | Insert at MRU, evict from LRU while over budget | O(1) amortized |
//! | `remove_oldest` | Pop the LRU node, fire the eviction callback | O(1) |
//!
//! # Eviction example
//!
//! ```text
//! Budget: 24 bytes, each entry charges 12
//!
//! add("a", ...)  →  [a]            12 bytes
//! add("b", ...)  →  [b, a]         24 bytes
//! add("c", ...)  →  [c, b]         "a" evicted (oldest)
//! get("b")       →  [b, c]         "b" rescued to MRU
//! add("d", ...)  →  [d, b]         "c" evicted, not "b"
//! ```
//!
//! A single value larger than the whole budget is admitted and then evicted
//! along with everything else, leaving the store empty with zero usage.
//!
//! # Thread safety
//!
//! `LruStore` is **not** thread-safe; [`ConcurrentCache`](crate::ConcurrentCache)
//! wraps it in a mutex for shared use.

use core::fmt;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

use crate::list::{Entry, List};
use crate::metrics::StoreMetrics;

/// Types that know their payload size in bytes.
///
/// The store charges `key.len() + value.byte_len()` per entry. Cached values
/// are usually [`ByteView`](crate::ByteView)s, but anything measurable works.
pub trait ByteLen {
    /// Payload size in bytes, as charged against the store budget.
    fn byte_len(&self) -> usize;
}

impl ByteLen for String {
    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for Vec<u8> {
    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }
}

/// Callback invoked with the owned `(key, value)` pair of every evicted entry.
pub type EvictCallback<V> = Box<dyn FnMut(String, V) + Send>;

/// One stored key-value pair, linked into the recency list.
struct StoreEntry<V> {
    key: String,
    value: V,
}

/// A byte-bounded LRU store.
///
/// `max_bytes == 0` means unbounded: nothing is ever evicted.
///
/// # Example
///
/// ```
/// use peercache_rs::{ByteView, LruStore};
///
/// let mut store: LruStore<ByteView> = LruStore::new(2 << 10, None);
/// store.add("color", ByteView::from("blue"));
///
/// assert_eq!(store.get("color").map(|v| v.to_vec()), Some(b"blue".to_vec()));
/// assert_eq!(store.used_bytes(), "color".len() + "blue".len());
/// ```
pub struct LruStore<V> {
    max_bytes: usize,
    used_bytes: usize,
    list: List<StoreEntry<V>>,
    map: HashMap<String, *mut Entry<StoreEntry<V>>>,
    on_evict: Option<EvictCallback<V>>,
    metrics: StoreMetrics,
}

// SAFETY: the store owns all nodes behind the raw pointers in `map`; they are
// only reachable through this struct, so sending the whole store to another
// thread is sound when the values and the callback are sendable.
unsafe impl<V: Send> Send for LruStore<V> {}

// SAFETY: every mutation requires `&mut self`; shared references expose no
// interior mutability, so they cannot race.
unsafe impl<V: Send> Sync for LruStore<V> {}

impl<V: ByteLen> LruStore<V> {
    /// Creates a store with the given byte budget and optional eviction
    /// callback.
    ///
    /// A budget of 0 disables eviction entirely.
    pub fn new(max_bytes: usize, on_evict: Option<EvictCallback<V>>) -> Self {
        LruStore {
            max_bytes,
            used_bytes: 0,
            list: List::new(),
            map: HashMap::new(),
            on_evict,
            metrics: StoreMetrics::new(max_bytes as u64),
        }
    }

    /// Number of entries currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the store holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bytes currently charged: the sum of `key.len() + value.byte_len()`
    /// over all entries.
    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// The configured byte budget (0 = unbounded).
    #[inline]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Hit/miss/eviction counters for this store.
    #[inline]
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Looks up `key`, promoting it to the most recently used position on a
    /// hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if let Some(&node) = self.map.get(key) {
            // SAFETY: node comes from our map, so it is linked in our list
            unsafe {
                self.list.move_to_front(node);
                let entry = (*node).value();
                self.metrics.record_hit(entry.value.byte_len() as u64);
                Some(&entry.value)
            }
        } else {
            self.metrics.record_miss();
            None
        }
    }

    /// Inserts or replaces `key`, then evicts oldest entries while the store
    /// is over budget.
    ///
    /// Replacing an existing key adjusts usage by the size difference of the
    /// two values and promotes the entry.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let new_len = value.byte_len();

        if let Some(&node) = self.map.get(&key) {
            // SAFETY: node comes from our map, so it is linked in our list
            unsafe {
                self.list.move_to_front(node);
                let entry = (*node).value_mut();
                let old_len = entry.value.byte_len();
                self.used_bytes = self.used_bytes - old_len + new_len;
                self.metrics.record_update(old_len as u64, new_len as u64);
                entry.value = value;
            }
        } else {
            let charged = key.len() + new_len;
            let node = self.list.push_front(StoreEntry {
                key: key.clone(),
                value,
            });
            self.map.insert(key, node);
            self.used_bytes += charged;
            self.metrics.record_insertion(new_len as u64);
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            self.remove_oldest();
        }
    }

    /// Evicts the least recently used entry, if any, and invokes the eviction
    /// callback with the owned pair.
    pub fn remove_oldest(&mut self) {
        if let Some(node) = self.list.remove_last() {
            // SAFETY: remove_last yields a detached, initialized node
            let entry = unsafe { node.into_value() };
            self.map.remove(&entry.key);
            self.used_bytes -= entry.key.len() + entry.value.byte_len();
            self.metrics.record_eviction(entry.value.byte_len() as u64);
            if let Some(on_evict) = self.on_evict.as_mut() {
                on_evict(entry.key, entry.value);
            }
        }
    }
}

impl<V> fmt::Debug for LruStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.map.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ByteView;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn entry(val: &str) -> ByteView {
        ByteView::from(val)
    }

    #[test]
    fn byte_accounting_tracks_every_mutation() {
        let mut store: LruStore<ByteView> = LruStore::new(0, None);
        store.add("k1", entry("1234"));
        store.add("k2", entry("value2"));
        assert_eq!(store.used_bytes(), 2 + 4 + 2 + 6);

        // Replacing adjusts by the size delta only.
        store.add("k1", entry("12345678"));
        assert_eq!(store.used_bytes(), 2 + 8 + 2 + 6);

        store.remove_oldest();
        store.remove_oldest();
        assert_eq!(store.used_bytes(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn get_promotes_and_preserves_membership() {
        let mut store: LruStore<ByteView> = LruStore::new(0, None);
        store.add("old", entry("x"));
        store.add("new", entry("y"));

        assert!(store.get("old").is_some());
        assert_eq!(store.len(), 2);

        // "new" is now the oldest.
        store.remove_oldest();
        assert!(store.get("new").is_none());
        assert!(store.get("old").is_some());
    }

    #[test]
    fn eviction_is_oldest_first_with_rescue() {
        // Three 12-byte entries against a 24-byte budget.
        let mut store: LruStore<ByteView> = LruStore::new(24, None);
        store.add("a", entry("12345678901"));
        store.add("b", entry("12345678901"));
        store.add("c", entry("12345678901"));

        // Adding "c" pushed usage to 36, evicting "a".
        assert!(store.get("a").is_none());
        assert_eq!(store.used_bytes(), 24);

        // Rescue "b", then "d" must evict "c".
        assert!(store.get("b").is_some());
        store.add("d", entry("12345678901"));
        assert!(store.get("c").is_none());
        assert!(store.get("b").is_some());
        assert!(store.get("d").is_some());
        assert!(store.used_bytes() <= 24);
    }

    #[test]
    fn oversized_value_clears_the_store() {
        let mut store: LruStore<ByteView> = LruStore::new(10, None);
        store.add("a", entry("12"));
        store.add("big", entry("this value alone exceeds the budget"));

        assert!(store.is_empty());
        assert_eq!(store.used_bytes(), 0);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn unbounded_store_never_evicts() {
        let mut store: LruStore<ByteView> = LruStore::new(0, None);
        for i in 0..1000 {
            store.add(format!("key-{i}"), entry("payload"));
        }
        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn eviction_callback_sees_owned_pairs() {
        let evicted = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&evicted);
        let callback: EvictCallback<ByteView> = Box::new(move |key, value| {
            assert!(key.starts_with("k"));
            assert_eq!(value.len(), 8);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        // Each entry charges 10 bytes; budget fits two.
        let mut store: LruStore<ByteView> = LruStore::new(20, Some(callback));
        store.add("k1", entry("12345678"));
        store.add("k2", entry("12345678"));
        store.add("k3", entry("12345678"));
        store.add("k4", entry("12345678"));

        assert_eq!(evicted.load(Ordering::SeqCst), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn metrics_record_hits_misses_and_evictions() {
        let mut store: LruStore<ByteView> = LruStore::new(10, None);
        store.add("a", entry("12"));
        assert!(store.get("a").is_some());
        assert!(store.get("missing").is_none());
        store.add("b", entry("1234567"));

        let metrics = store.metrics();
        assert_eq!(metrics.requests, 2);
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.evictions, 1);
    }
}
