//! Configuration structures.
//!
//! Every composite component is created from a small config struct with
//! public fields, so construction sites read as literals and new parameters
//! can be added without breaking call sites.

/// Configuration for a [`Group`](crate::Group).
///
/// Both of the group's caches (primary and remote/hot) are bounded to
/// `max_bytes` each.
///
/// # Example
///
/// ```
/// use peercache_rs::GroupConfig;
///
/// let config = GroupConfig::new("scores", 2 << 10);
/// assert_eq!(config.name, "scores");
/// assert_eq!(config.max_bytes, 2048);
/// ```
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Name under which the group is registered and addressed by peers.
    pub name: String,
    /// Byte budget of each of the group's two caches (0 = unbounded).
    pub max_bytes: usize,
}

impl GroupConfig {
    /// Creates a group configuration.
    pub fn new(name: impl Into<String>, max_bytes: usize) -> Self {
        GroupConfig {
            name: name.into(),
            max_bytes,
        }
    }
}

/// Configuration for an [`HttpPool`](crate::http::HttpPool).
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpPoolConfig {
    /// This node's advertised base address, e.g. `http://10.0.0.1:7001`.
    pub addr: String,
    /// Path prefix under which groups are served.
    pub prefix: String,
    /// Virtual replicas per node on the peer ring.
    pub replicas: usize,
}

#[cfg(feature = "http")]
impl HttpPoolConfig {
    /// Creates a pool configuration with the default prefix and replica
    /// count.
    pub fn new(addr: impl Into<String>) -> Self {
        HttpPoolConfig {
            addr: addr.into(),
            prefix: crate::http::DEFAULT_PREFIX.to_owned(),
            replicas: crate::consistenthash::DEFAULT_REPLICAS,
        }
    }
}
