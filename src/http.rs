//! HTTP transport binding.
//!
//! Peers serve their groups over plain HTTP: `GET <prefix><group>/<key>`
//! answers with the value bytes as `application/octet-stream`. [`HttpPool`]
//! is one node's half of the mesh: it routes incoming cache requests to the
//! groups of its registry and, as a [`NodePicker`], routes outgoing lookups
//! to the peer owning the key. [`HttpNodeClient`] is the outgoing half, a
//! blocking HTTP client per peer.
//!
//! Status mapping, matching what peers expect:
//!
//! | Condition | Status |
//! |---|---|
//! | Path without the pool prefix | 400 |
//! | Fewer than two path segments after the prefix | 400 |
//! | Unknown group | 404 |
//! | Loader or peer error during the load | 500 |
//! | Success | 200, `application/octet-stream` |
//!
//! Group and key segments are percent-encoded on the wire, so keys may
//! contain any byte including `/`.
//!
//! The blocking client must never run on an async runtime worker; the server
//! handler hops through `spawn_blocking` before entering the (blocking) group
//! read path.

use core::fmt;
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::HttpPoolConfig;
use crate::consistenthash::HashRing;
use crate::error::CacheError;
use crate::node::{NodeClient, NodePicker};
use crate::registry::{default_registry, Registry};

/// Path prefix under which groups are served by default.
pub const DEFAULT_PREFIX: &str = "/cache/";

/// One node's HTTP endpoint and peer table.
///
/// The pool serves the groups of its registry and picks peers for outgoing
/// lookups through a consistent-hash ring over the node addresses handed to
/// [`HttpPool::set_nodes`]. Node addresses are advertised base URLs such as
/// `http://10.0.0.1:7001`; the pool recognizes itself by its own address and
/// never returns itself as a peer.
pub struct HttpPool {
    addr: String,
    prefix: String,
    replicas: usize,
    registry: Arc<Registry>,
    ring: Mutex<HashRing>,
    clients: Mutex<HashMap<String, Arc<dyn NodeClient>>>,
}

impl HttpPool {
    /// Creates a pool for this node's address, backed by the process-wide
    /// registry and the default prefix.
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_config(HttpPoolConfig::new(addr), default_registry())
    }

    /// Creates a pool from an explicit configuration and registry handle.
    pub fn with_config(config: HttpPoolConfig, registry: Arc<Registry>) -> Self {
        let replicas = config.replicas;
        HttpPool {
            addr: config.addr,
            prefix: config.prefix,
            replicas,
            registry,
            ring: Mutex::new(HashRing::new(replicas)),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// This node's advertised base address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Replaces the peer set.
    ///
    /// Rebuilds the ring and one client per address. The local address
    /// should be part of the set so every node agrees on key ownership.
    pub fn set_nodes<I, S>(&self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ring = HashRing::new(self.replicas);
        let mut clients: HashMap<String, Arc<dyn NodeClient>> = HashMap::new();

        for node in nodes {
            let node = node.into();
            ring.add([node.as_str()]);
            let base_url = format!("{}{}", node, self.prefix);
            let client: Arc<dyn NodeClient> = Arc::new(HttpNodeClient::new(base_url));
            clients.insert(node, client);
        }

        *self.ring.lock() = ring;
        *self.clients.lock() = clients;
    }

    /// Builds the axum router serving this pool's registry.
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .fallback(serve_cache)
            .with_state(Arc::clone(self))
    }

    /// Serves the pool on `listener` until the task is dropped.
    pub async fn serve(self: Arc<Self>, listener: tokio::net::TcpListener) -> std::io::Result<()> {
        axum::serve(listener, self.router()).await
    }
}

impl NodePicker for HttpPool {
    fn pick_node(&self, key: &str) -> Option<Arc<dyn NodeClient>> {
        let owner = {
            let ring = self.ring.lock();
            let owner = ring.get(key)?;
            if owner == self.addr {
                return None;
            }
            owner.to_owned()
        };
        self.clients.lock().get(&owner).map(Arc::clone)
    }
}

impl NodePicker for Arc<HttpPool> {
    fn pick_node(&self, key: &str) -> Option<Arc<dyn NodeClient>> {
        NodePicker::pick_node(&**self, key)
    }
}

impl fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPool")
            .field("addr", &self.addr)
            .field("prefix", &self.prefix)
            .field("peers", &self.clients.lock().len())
            .finish()
    }
}

/// Fallback handler implementing the `<prefix><group>/<key>` scheme.
async fn serve_cache(
    State(pool): State<Arc<HttpPool>>,
    method: Method,
    uri: Uri,
) -> Response {
    let path = uri.path();
    debug!(server = %pool.addr, %method, path, "cache request");

    let Some(rest) = path.strip_prefix(pool.prefix.as_str()) else {
        return (StatusCode::BAD_REQUEST, "bad request").into_response();
    };

    // Split on the raw path first so percent-encoded slashes in the key
    // survive, then decode each segment.
    let mut segments = rest.splitn(2, '/');
    let (Some(group_part), Some(key_part)) = (segments.next(), segments.next()) else {
        return (StatusCode::BAD_REQUEST, "bad request").into_response();
    };

    let (Ok(group_name), Ok(key)) = (
        urlencoding::decode(group_part),
        urlencoding::decode(key_part),
    ) else {
        return (StatusCode::BAD_REQUEST, "bad request").into_response();
    };

    let Some(group) = pool.registry.get_group(&group_name) else {
        return (
            StatusCode::NOT_FOUND,
            format!("no such group: {group_name}"),
        )
            .into_response();
    };

    // Group reads block (locks, peer fetches, the loader); keep them off the
    // async workers.
    let key = key.into_owned();
    match tokio::task::spawn_blocking(move || group.get(&key)).await {
        Ok(Ok(view)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Ok(Err(err)) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("load task failed: {err}"),
        )
            .into_response(),
    }
}

/// Blocking HTTP client for one peer.
#[derive(Debug)]
pub struct HttpNodeClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpNodeClient {
    /// Creates a client for a peer base URL including the path prefix,
    /// e.g. `http://10.0.0.2:7001/cache/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpNodeClient {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn request_url(&self, group: &str, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        )
    }
}

impl NodeClient for HttpNodeClient {
    fn get(&self, group: &str, key: &str) -> Result<Vec<u8>, CacheError> {
        let url = self.request_url(group, key);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| CacheError::PeerFetch(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::PeerFetch(format!("server returned {status}")));
        }

        response
            .bytes()
            .map(|body| body.to_vec())
            .map_err(|err| CacheError::PeerFetch(err.to_string()))
    }
}
