//! Three-node cluster demo.
//!
//! Starts three cache nodes in one process, each with its own registry and
//! HTTP pool on an ephemeral localhost port, all serving a group named
//! "scores" over a tiny shared dataset. Reads are then issued through every
//! node to show peer routing: each key is loaded from the backend exactly
//! once, by the node that owns it on the ring.
//!
//! ```text
//! cargo run --example cluster --features http
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use peercache_rs::http::HttpPool;
use peercache_rs::{CacheError, Group, HttpPoolConfig, Registry};

fn main() {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");

    let db: Arc<HashMap<&str, &str>> =
        Arc::new(HashMap::from([("1", "630"), ("2", "589"), ("3", "567")]));

    // Bind first so every node knows the full, final peer set.
    let listeners: Vec<tokio::net::TcpListener> = (0..3)
        .map(|_| {
            runtime
                .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
                .expect("bind ephemeral port")
        })
        .collect();

    let addrs: Vec<String> = listeners
        .iter()
        .map(|listener| format!("http://{}", listener.local_addr().unwrap()))
        .collect();

    let mut nodes: Vec<(String, Arc<Group>)> = Vec::new();
    for (i, listener) in listeners.into_iter().enumerate() {
        let registry = Arc::new(Registry::new());

        let backend = Arc::clone(&db);
        let node_addr = addrs[i].clone();
        let group = registry.new_group("scores", 2 << 10, move |key: &str| {
            println!("[{node_addr}] loading {key} from the backend");
            backend
                .get(key)
                .map(|value| value.as_bytes().to_vec())
                .ok_or_else(|| CacheError::NotFound(key.to_owned()))
        });

        let pool = Arc::new(HttpPool::with_config(
            HttpPoolConfig::new(addrs[i].clone()),
            Arc::clone(&registry),
        ));
        pool.set_nodes(addrs.iter().cloned());
        group.register_picker(Arc::clone(&pool));

        runtime.spawn(Arc::clone(&pool).serve(listener));
        nodes.push((addrs[i].clone(), group));
    }

    // Ask every node for every key, twice. The second round is all cache
    // hits; the first loads each key once, on its owning node.
    for round in 1..=2 {
        println!("--- round {round} ---");
        for key in ["1", "2", "3"] {
            for (addr, group) in &nodes {
                match group.get(key) {
                    Ok(view) => println!("[{addr}] {key} = {view}"),
                    Err(err) => println!("[{addr}] {key}: {err}"),
                }
            }
        }
    }

    println!("--- stats ---");
    for (addr, group) in &nodes {
        let stats = group.stats();
        println!(
            "[{addr}] gets={} cache_hits={} local_loads={} peer_loads={}",
            stats.gets, stats.cache_hits, stats.local_loads, stats.peer_loads
        );
    }
}
