//! Consistent hashing with virtual replicas.
//!
//! Maps keys to node names on a hash ring. Each node occupies
//! [`DEFAULT_REPLICAS`] positions (virtual nodes) so the keyspace spreads
//! evenly even with a handful of physical nodes, and adding a node only
//! remaps the keys whose nearest position changed.
//!
//! A key belongs to the first virtual node clockwise from its own hash;
//! searching past the largest position wraps to the smallest, closing the
//! ring.

use core::fmt;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Virtual replicas per node when none are specified.
///
/// Fifty positions per node keep the spread between the most and least
/// loaded node small without noticeably growing the ring.
pub const DEFAULT_REPLICAS: usize = 50;

/// Hash function mapping bytes onto the 32-bit ring.
pub type HashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// A consistent-hash ring of named nodes.
///
/// # Example
///
/// ```
/// use peercache_rs::HashRing;
///
/// let mut ring = HashRing::default();
/// ring.add(["node-a", "node-b", "node-c"]);
///
/// let owner = ring.get("some-key").unwrap();
/// assert!(["node-a", "node-b", "node-c"].contains(&owner));
///
/// // Stable: the same key maps to the same node.
/// assert_eq!(ring.get("some-key"), Some(owner));
/// ```
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted virtual-node positions.
    keys: Vec<u32>,
    /// Position → node name. Duplicate positions collapse here, last write
    /// wins.
    nodes: HashMap<u32, String>,
}

impl HashRing {
    /// Creates a ring using CRC-32 with `replicas` virtual nodes per name.
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, Box::new(|data| crc32fast::hash(data)))
    }

    /// Creates a ring with a custom hash function.
    pub fn with_hash(replicas: usize, hash: HashFn) -> Self {
        HashRing {
            hash,
            replicas,
            keys: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    /// Number of virtual-node positions on the ring.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no nodes have been added.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Adds nodes to the ring.
    ///
    /// Each name is hashed at `replicas` positions formed from the decimal
    /// replica index prepended to the name. The position vector is re-sorted
    /// once after all insertions.
    pub fn add<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            for i in 0..self.replicas {
                let virtual_name = format!("{i}{name}");
                let position = (self.hash)(virtual_name.as_bytes());
                self.keys.push(position);
                self.nodes.insert(position, name.clone());
            }
        }
        self.keys.sort_unstable();
    }

    /// Returns the node owning `key`, or `None` for an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());

        // First position at or clockwise of the key's hash; wrap past the
        // end to close the ring.
        let idx = self.keys.partition_point(|&position| position < hash);
        let idx = if idx == self.keys.len() { 0 } else { idx };

        self.nodes.get(&self.keys[idx]).map(String::as_str)
    }
}

impl Default for HashRing {
    fn default() -> Self {
        HashRing::new(DEFAULT_REPLICAS)
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("positions", &self.keys.len())
            .finish()
    }
}
