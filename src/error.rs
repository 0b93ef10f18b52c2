//! Error type shared across the crate.
//!
//! Every fallible operation returns [`CacheError`]. The enum is `Clone` so a
//! single load result can be handed to every coalesced waiter, and loader
//! errors can cross the HTTP boundary as plain strings.

use thiserror::Error;

/// Errors surfaced by groups, loaders and the peer transport.
///
/// Loader errors ([`CacheError::NotFound`], [`CacheError::Backend`]) propagate
/// out of [`Group::get`](crate::Group::get) unchanged. Peer errors
/// ([`CacheError::PeerFetch`]) are logged and downgraded to a local load; they
/// only reach the caller when they are all the caller's own transport has.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// An empty key was passed to [`Group::get`](crate::Group::get).
    #[error("key must not be empty")]
    EmptyKey,

    /// The loader reports that the key does not exist in the backend.
    ///
    /// Not-found results are never cached.
    #[error("key {0:?} not found")]
    NotFound(String),

    /// A peer fetch failed: transport error or non-2xx response.
    #[error("peer fetch failed: {0}")]
    PeerFetch(String),

    /// The loader failed for a reason other than a missing key.
    #[error("backend load failed: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_key() {
        let err = CacheError::NotFound("color".to_owned());
        assert_eq!(err.to_string(), "key \"color\" not found");
    }

    #[test]
    fn errors_are_cloneable() {
        let err = CacheError::PeerFetch("connection refused".to_owned());
        assert_eq!(err.clone(), err);
    }
}
