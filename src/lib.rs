#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! Quick orientation for the crate's building blocks, leaves first.
//!
//! ## Component Map
//!
//! | Component | Type | Responsibility |
//! |-----------|------|----------------|
//! | [`ByteView`] | value | Immutable byte buffer, defensive copies |
//! | [`LruStore`] | store | Byte-bounded LRU with eviction callback |
//! | [`ConcurrentCache`] | store | Mutex-guarded, lazily initialized LRU |
//! | [`SingleFlight`] | coordination | At-most-one load per key |
//! | [`HashRing`] | routing | Key→node mapping with virtual replicas |
//! | [`BloomFilter`] | auxiliary | Approximate set membership |
//! | [`Group`] | coordination | The read-through path |
//! | [`Registry`] | naming | Process-wide named groups |
//! | `http::HttpPool` | transport | Peer server + picker (feature `http`) |
//!
//! ## A Node in One Picture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Group "scores"                        │
//! │                                                                  │
//! │   get(key) ──▶ primary cache ──▶ remote/hot cache ──▶ load       │
//! │                 (ConcurrentCache)  (ConcurrentCache)    │        │
//! │                                                         ▼        │
//! │                                   ┌─────────── SingleFlight ───┐ │
//! │                                   │ peer fetch (HashRing pick) │ │
//! │                                   │      else local Getter     │ │
//! │                                   └────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Choosing an Entry Point
//!
//! - Just caching in one process: [`new_group`] and [`Group::get`].
//! - A cache mesh: enable feature `http`, give each node an
//!   [`http::HttpPool`], call [`Group::register_picker`].
//! - Embedding several isolated nodes in one process: one [`Registry`] per
//!   node via [`Registry::new`].
//! - Building your own transport: implement [`NodePicker`] and
//!   [`NodeClient`].

/// Immutable byte views over cached values.
pub mod view;

/// Doubly linked recency list.
///
/// Internal infrastructure for the LRU store; exposes raw pointer
/// operations that require careful invariant maintenance, so it stays
/// crate-private.
pub(crate) mod list;

/// Byte-bounded Least Recently Used store.
///
/// The single-threaded storage engine: a hash map over an intrusive recency
/// list, charging `key length + value length` per entry against a byte
/// budget.
pub mod lru;

/// Cache metrics.
///
/// Hit/miss/eviction counters per store and atomic read-path counters per
/// group, all reported through one `CacheMetrics` trait.
pub mod metrics;

/// Mutex-guarded cache wrapper.
///
/// The thread-safe shell the group places around each of its two stores.
pub mod concurrent;

/// Per-key request coalescing.
///
/// Guarantees at most one running load per key; concurrent callers share
/// the leader's result.
pub mod singleflight;

/// Consistent hashing with virtual replicas.
///
/// Maps keys onto named nodes; the routing core of the peer mesh.
pub mod consistenthash;

/// Probabilistic set membership.
pub mod bloom;

/// Peer capability traits.
pub mod node;

/// Configuration structures.
pub mod config;

/// Error type shared across the crate.
pub mod error;

/// Group coordination: the read-through path.
pub mod group;

/// Named group registries.
pub mod registry;

/// HTTP transport binding.
///
/// One node's HTTP endpoint plus the matching peer client. Available with
/// the `http` feature.
#[cfg(feature = "http")]
pub mod http;

// Re-export the crate surface
pub use bloom::BloomFilter;
pub use concurrent::ConcurrentCache;
pub use config::GroupConfig;
pub use consistenthash::{HashFn, HashRing, DEFAULT_REPLICAS};
pub use error::CacheError;
pub use group::{Getter, Group};
pub use lru::{ByteLen, EvictCallback, LruStore};
pub use metrics::{CacheMetrics, GroupStats, GroupStatsSnapshot, StoreMetrics};
pub use node::{NodeClient, NodePicker};
pub use registry::{default_registry, get_group, new_group, Registry};
pub use singleflight::SingleFlight;
pub use view::ByteView;

#[cfg(feature = "http")]
pub use config::HttpPoolConfig;
