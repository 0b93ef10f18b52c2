//! Peer capability traits.
//!
//! The cache core never speaks a wire protocol itself. Peer awareness enters
//! through two one-method traits: a [`NodePicker`] decides which node owns a
//! key, and a [`NodeClient`] fetches a value from that node. The bundled
//! HTTP binding implements both; tests substitute stubs.

use std::sync::Arc;

use crate::error::CacheError;

/// Fetches a value for a `(group, key)` pair from one remote node.
pub trait NodeClient: Send + Sync {
    /// Requests the value of `key` in `group` from the remote node.
    ///
    /// Any transport failure or non-success response surfaces as
    /// [`CacheError::PeerFetch`].
    fn get(&self, group: &str, key: &str) -> Result<Vec<u8>, CacheError>;
}

/// Chooses the node responsible for a key.
pub trait NodePicker: Send + Sync {
    /// Returns a client for the node owning `key`, or `None` when no peer
    /// should be consulted.
    ///
    /// Implementations must return `None` when the chosen node is the local
    /// node itself; a node fetching from itself over the transport would
    /// re-enter its own load path.
    fn pick_node(&self, key: &str) -> Option<Arc<dyn NodeClient>>;
}
