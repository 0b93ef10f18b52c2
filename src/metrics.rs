//! Cache metrics.
//!
//! Two observation points exist: each LRU store counts hits, misses,
//! insertions and evictions under its own lock ([`StoreMetrics`]), and each
//! group counts read-path outcomes with atomics ([`GroupStats`]) because the
//! group is shared across threads without a lock of its own.
//!
//! Reporting goes through [`CacheMetrics::metrics`], which returns a
//! `BTreeMap` so keys always appear in a deterministic order (stable test
//! output, predictable exports).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Common reporting interface for every metrics-bearing component.
pub trait CacheMetrics {
    /// Returns the component's metrics as key-value pairs in deterministic
    /// order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// A short name identifying the component being measured.
    fn component_name(&self) -> &'static str;
}

/// Counters maintained by a single LRU store.
///
/// Updated by the store while its caller holds the store lock, so plain
/// integers suffice.
#[derive(Debug, Default, Clone)]
pub struct StoreMetrics {
    /// Total number of lookups.
    pub requests: u64,
    /// Lookups that found the key.
    pub hits: u64,
    /// Bytes served from the store (hits only).
    pub bytes_served: u64,
    /// Bytes written into the store.
    pub bytes_written: u64,
    /// Entries evicted to satisfy the byte budget.
    pub evictions: u64,
    /// Current stored payload size in bytes.
    pub cache_size_bytes: u64,
    /// Configured byte budget (0 = unbounded).
    pub max_cache_size_bytes: u64,
}

impl StoreMetrics {
    /// Creates metrics for a store with the given byte budget.
    pub fn new(max_cache_size_bytes: u64) -> Self {
        Self {
            max_cache_size_bytes,
            ..Default::default()
        }
    }

    /// Records a lookup that found its key.
    pub fn record_hit(&mut self, object_size: u64) {
        self.requests += 1;
        self.hits += 1;
        self.bytes_served += object_size;
    }

    /// Records a lookup that missed.
    pub fn record_miss(&mut self) {
        self.requests += 1;
    }

    /// Records an insertion of `object_size` payload bytes.
    pub fn record_insertion(&mut self, object_size: u64) {
        self.bytes_written += object_size;
        self.cache_size_bytes += object_size;
    }

    /// Records a replacement that changed the stored payload size.
    pub fn record_update(&mut self, old_size: u64, new_size: u64) {
        self.bytes_written += new_size;
        self.cache_size_bytes = self.cache_size_bytes - old_size + new_size;
    }

    /// Records an eviction of `evicted_size` payload bytes.
    pub fn record_eviction(&mut self, evicted_size: u64) {
        self.evictions += 1;
        self.cache_size_bytes = self.cache_size_bytes.saturating_sub(evicted_size);
    }

    /// Fraction of lookups served from the store, in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.requests as f64
        }
    }
}

impl CacheMetrics for StoreMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("requests".to_owned(), self.requests as f64);
        map.insert("hits".to_owned(), self.hits as f64);
        map.insert("hit_rate".to_owned(), self.hit_rate());
        map.insert("bytes_served".to_owned(), self.bytes_served as f64);
        map.insert("bytes_written".to_owned(), self.bytes_written as f64);
        map.insert("evictions".to_owned(), self.evictions as f64);
        map.insert("cache_size_bytes".to_owned(), self.cache_size_bytes as f64);
        map.insert(
            "max_cache_size_bytes".to_owned(),
            self.max_cache_size_bytes as f64,
        );
        map
    }

    fn component_name(&self) -> &'static str {
        "lru_store"
    }
}

/// Read-path counters for one group, shared across threads.
#[derive(Debug, Default)]
pub struct GroupStats {
    /// Calls to `Group::get`.
    pub gets: AtomicU64,
    /// Gets answered by the primary cache.
    pub cache_hits: AtomicU64,
    /// Gets answered by the remote/hot cache.
    pub remote_hits: AtomicU64,
    /// Load attempts that entered the coalescer as leader.
    pub loads: AtomicU64,
    /// Loads answered by the local getter.
    pub local_loads: AtomicU64,
    /// Loads answered by a peer.
    pub peer_loads: AtomicU64,
    /// Peer fetches that failed and fell back to the local getter.
    pub peer_errors: AtomicU64,
    /// Local loads that returned an error.
    pub load_errors: AtomicU64,
}

impl GroupStats {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of all counters.
    pub fn snapshot(&self) -> GroupStatsSnapshot {
        GroupStatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            remote_hits: self.remote_hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            local_loads: self.local_loads.load(Ordering::Relaxed),
            peer_loads: self.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
            load_errors: self.load_errors.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for GroupStats {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let snap = self.snapshot();
        let mut map = BTreeMap::new();
        map.insert("gets".to_owned(), snap.gets as f64);
        map.insert("cache_hits".to_owned(), snap.cache_hits as f64);
        map.insert("remote_hits".to_owned(), snap.remote_hits as f64);
        map.insert("loads".to_owned(), snap.loads as f64);
        map.insert("local_loads".to_owned(), snap.local_loads as f64);
        map.insert("peer_loads".to_owned(), snap.peer_loads as f64);
        map.insert("peer_errors".to_owned(), snap.peer_errors as f64);
        map.insert("load_errors".to_owned(), snap.load_errors as f64);
        map
    }

    fn component_name(&self) -> &'static str {
        "group"
    }
}

/// A point-in-time copy of a group's [`GroupStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStatsSnapshot {
    /// Calls to `Group::get`.
    pub gets: u64,
    /// Gets answered by the primary cache.
    pub cache_hits: u64,
    /// Gets answered by the remote/hot cache.
    pub remote_hits: u64,
    /// Load attempts that entered the coalescer as leader.
    pub loads: u64,
    /// Loads answered by the local getter.
    pub local_loads: u64,
    /// Loads answered by a peer.
    pub peer_loads: u64,
    /// Peer fetches that failed and fell back to the local getter.
    pub peer_errors: u64,
    /// Local loads that returned an error.
    pub load_errors: u64,
}
