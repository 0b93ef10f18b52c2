//! Concurrent correctness tests.
//!
//! Validates that the shared components keep their contracts when hammered
//! from multiple threads: one loader run per coalesced key, stable byte
//! bounds under churn, and identical results for every racing caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use peercache_rs::{new_group, ByteView, CacheError, ConcurrentCache, SingleFlight};

// ============================================================================
// SINGLE-FLIGHT
// ============================================================================

#[test]
fn test_racing_gets_share_one_load() {
    const THREADS: usize = 8;

    let flight: Arc<SingleFlight<ByteView>> = Arc::new(SingleFlight::new());
    let executions = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let flight = Arc::clone(&flight);
            let executions = Arc::clone(&executions);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                flight
                    .run("hot", || {
                        executions.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(200));
                        Ok(ByteView::from("value"))
                    })
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().to_vec(), b"value");
    }
    assert_eq!(executions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_leader_errors_reach_every_waiter() {
    const THREADS: usize = 6;

    let flight: Arc<SingleFlight<ByteView>> = Arc::new(SingleFlight::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let flight = Arc::clone(&flight);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                flight.run("broken", || {
                    thread::sleep(Duration::from_millis(50));
                    Err(CacheError::Backend("db offline".to_owned()))
                })
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(
            handle.join().unwrap(),
            Err(CacheError::Backend("db offline".to_owned()))
        );
    }
}

// ============================================================================
// GROUP READ PATH UNDER CONCURRENCY
// ============================================================================

#[test]
fn test_group_loads_once_per_key_under_race() {
    const THREADS: usize = 8;
    const KEYS: usize = 16;

    let counts: Arc<Mutex<HashMap<String, u32>>> = Arc::new(Mutex::new(HashMap::new()));
    let loads = Arc::clone(&counts);

    let group = new_group("concurrent_db", 1 << 20, move |key: &str| {
        *loads.lock().unwrap().entry(key.to_owned()).or_insert(0) += 1;
        // Slow enough that racing readers overlap the load window.
        thread::sleep(Duration::from_millis(20));
        Ok(format!("value-of-{key}").into_bytes())
    });

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let group = Arc::clone(&group);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..KEYS {
                    let key = format!("key-{i}");
                    let view = group.get(&key).unwrap();
                    assert_eq!(view.to_string(), format!("value-of-{key}"));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Every racing reader was either coalesced or served from cache. A
    // caller arriving in the instant between load completion and its own
    // flight registration may trigger one extra load, but never one per
    // reader.
    let counts = counts.lock().unwrap();
    assert_eq!(counts.len(), KEYS);
    let total: u32 = counts.values().sum();
    for (key, count) in counts.iter() {
        assert!(*count <= 2, "{key} loaded {count} times");
    }
    assert!(
        total <= (KEYS as u32) + 2,
        "{total} loads for {KEYS} keys across {THREADS} readers"
    );
}

// ============================================================================
// CONCURRENT CACHE INVARIANTS
// ============================================================================

#[test]
fn test_cache_bound_holds_under_churn() {
    const THREADS: usize = 4;
    const BUDGET: usize = 4096;

    let cache = Arc::new(ConcurrentCache::new(BUDGET));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("t{t}-key-{i}");
                    cache.add(key.clone(), ByteView::from("sixteen byte val"));
                    assert!(cache.used_bytes() <= BUDGET);
                    let _ = cache.get(&key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.used_bytes() <= BUDGET);
    assert!(cache.len() > 0);
}
