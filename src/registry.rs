//! Named group registries.
//!
//! Groups are addressed by name, both locally and by peers serving
//! `/<prefix>/<group>/<key>` requests. A [`Registry`] maps names to live
//! groups behind a reader/writer lock; writers only appear when a group is
//! created, so lookups on the hot path take the shared lock.
//!
//! Most processes use the process-wide default registry through the free
//! functions [`new_group`] and [`get_group`]. Embedders that host several
//! isolated nodes in one process (tests, simulations) create their own
//! [`Registry`] handles instead.

use core::fmt;
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::config::GroupConfig;
use crate::group::{Getter, Group};

static DEFAULT_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// A name→group map with process lifetime.
///
/// Groups are never un-registered; re-registering a name replaces the entry
/// for future lookups while existing handles stay valid.
pub struct Registry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a group and registers it under `name`.
    ///
    /// Both of the group's caches are bounded to `max_bytes` each. The
    /// getter is required; a group without a loader cannot answer misses.
    pub fn new_group(
        &self,
        name: impl Into<String>,
        max_bytes: usize,
        getter: impl Getter + 'static,
    ) -> Arc<Group> {
        let name = name.into();
        let group = Arc::new(Group::new(
            GroupConfig::new(name.clone(), max_bytes),
            Box::new(getter),
        ));
        self.groups.write().insert(name, Arc::clone(&group));
        group
    }

    /// Looks up a group by exact name.
    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    /// Returns `true` when no groups are registered.
    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("groups", &self.groups.read().len())
            .finish()
    }
}

/// The process-wide registry used by [`new_group`] and [`get_group`].
pub fn default_registry() -> Arc<Registry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

/// Creates a group in the process-wide registry.
///
/// See [`Registry::new_group`].
pub fn new_group(
    name: impl Into<String>,
    max_bytes: usize,
    getter: impl Getter + 'static,
) -> Arc<Group> {
    DEFAULT_REGISTRY.new_group(name, max_bytes, getter)
}

/// Looks up a group in the process-wide registry.
///
/// See [`Registry::get_group`].
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    DEFAULT_REGISTRY.get_group(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    fn noop_getter() -> impl Getter {
        |key: &str| -> Result<Vec<u8>, CacheError> { Ok(key.as_bytes().to_vec()) }
    }

    #[test]
    fn lookup_requires_the_exact_name() {
        let registry = Registry::new();
        registry.new_group("db", 2 << 10, noop_getter());

        let group = registry.get_group("db").expect("group db must exist");
        assert_eq!(group.name(), "db");
        assert!(registry.get_group("db ").is_none());
    }

    #[test]
    fn handles_stay_valid_after_replacement() {
        let registry = Registry::new();
        let first = registry.new_group("dup", 64, noop_getter());
        let second = registry.new_group("dup", 64, noop_getter());

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(
            &registry.get_group("dup").unwrap(),
            &second
        ));
        // The replaced handle still works.
        assert_eq!(first.get("k").unwrap().to_vec(), b"k");
    }

    #[test]
    fn default_registry_is_shared_process_wide() {
        new_group("registry-smoke", 64, noop_getter());
        let found = get_group("registry-smoke").expect("group must be visible");
        assert_eq!(found.name(), "registry-smoke");
        assert!(default_registry().get_group("registry-smoke").is_some());
    }
}
