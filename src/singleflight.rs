//! Per-key request coalescing.
//!
//! When several threads miss the cache on the same key at the same time, only
//! one of them should pay for the load. [`SingleFlight::run`] guarantees
//! at-most-one execution of the work closure per key: the first caller (the
//! leader) runs it, everyone else blocks on a completion latch and receives a
//! clone of the leader's result, success or error alike.
//!
//! ```text
//! thread A ── run("k", load) ──▶ leader: runs `load`, fills the slot
//! thread B ── run("k", ...)  ──▶ waits on the latch ─┐
//! thread C ── run("k", ...)  ──▶ waits on the latch ─┤─▶ clone of A's result
//!                                                    │
//! thread A ───────── notify_all ─────────────────────┘
//! ```
//!
//! The key is reclaimed after the leader finishes, so a later `run` with the
//! same key performs a fresh load. The work closure must not re-enter the
//! same coalescer with the same key; that caller would wait on itself.

use core::fmt;
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

use parking_lot::{Condvar, Mutex};

use crate::error::CacheError;

/// One in-flight (or just-finished) load.
///
/// The slot doubles as the completion flag: waiters sleep on the condvar
/// until it holds a result.
struct Call<T> {
    slot: Mutex<Option<Result<T, CacheError>>>,
    done: Condvar,
}

impl<T: Clone> Call<T> {
    fn new() -> Self {
        Call {
            slot: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Result<T, CacheError> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut slot);
        }
    }

    fn finish(&self, result: Result<T, CacheError>) {
        *self.slot.lock() = Some(result);
        self.done.notify_all();
    }
}

/// Deduplicates concurrent loads keyed by string.
///
/// # Example
///
/// ```
/// use peercache_rs::SingleFlight;
///
/// let flight: SingleFlight<u64> = SingleFlight::new();
/// let value = flight.run("answer", || Ok(42))?;
/// assert_eq!(value, 42);
/// # Ok::<(), peercache_rs::CacheError>(())
/// ```
pub struct SingleFlight<T> {
    calls: Mutex<Option<HashMap<String, Arc<Call<T>>>>>,
}

impl<T: Clone> SingleFlight<T> {
    /// Creates an empty coalescer. The call map is allocated on first use.
    pub fn new() -> Self {
        SingleFlight {
            calls: Mutex::new(None),
        }
    }

    /// Runs `work` for `key`, unless a load for `key` is already in flight,
    /// in which case the caller blocks and receives that load's result.
    ///
    /// Errors are replicated to every waiter verbatim. There is no retry and
    /// no timeout at this layer; a `work` that never returns blocks every
    /// coalesced caller for that key.
    pub fn run<F>(&self, key: &str, work: F) -> Result<T, CacheError>
    where
        F: FnOnce() -> Result<T, CacheError>,
    {
        let mut calls = self.calls.lock();
        let map = calls.get_or_insert_with(HashMap::new);

        if let Some(existing) = map.get(key) {
            let call = Arc::clone(existing);
            drop(calls);
            return call.wait();
        }

        let call = Arc::new(Call::new());
        map.insert(key.to_owned(), Arc::clone(&call));
        drop(calls);

        let result = work();
        call.finish(result.clone());

        let mut calls = self.calls.lock();
        if let Some(map) = calls.as_mut() {
            map.remove(key);
        }

        result
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        SingleFlight::new()
    }
}

impl<T> fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let calls = self.calls.lock();
        f.debug_struct("SingleFlight")
            .field(
                "in_flight",
                &calls.as_ref().map_or(0, |map| map.len()),
            )
            .finish()
    }
}
