//! Bounded in-memory component instance cache with per-id request serialization.
//!
//! Requests for the same component id read, mutate and write back the same
//! instance, so they must not interleave. [`InstanceCache::lock`] hands out
//! one async mutex per id; a handler holds it from lookup until the instance
//! is written back. Instances are evicted least-recently-used once the cache
//! is full, and a lock entry lives only while someone holds or waits on it.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use reactor::core::component::{Component, ComponentFactory};
use reactor::core::error::Result;
use serde_json::{Map, Value};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::components::Registry;

/// Instances kept when no capacity is configured.
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(capacity) => capacity,
    None => panic!("capacity must be non-zero"),
};

/// Live instances keyed by component id.
pub struct InstanceCache {
    instances: Mutex<LruCache<String, Box<dyn Component>>>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Default for InstanceCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InstanceCache {
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            instances: Mutex::new(LruCache::new(capacity)),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to component `id`.
    pub async fn lock(&self, id: &str) -> IdGuard<'_> {
        let slot = self.locks.lock().entry(id.to_string()).or_default().clone();
        let guard = slot.lock_owned().await;
        IdGuard {
            cache: self,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    /// Remove and return the cached instance for `id`.
    pub fn take(&self, id: &str) -> Option<Box<dyn Component>> {
        self.instances.lock().pop(id)
    }

    /// Store `component` under its own id, evicting the least recently used
    /// instance if the cache is full.
    pub fn put(&self, component: Box<dyn Component>) {
        let id = component.id().to_string();
        let evicted = self.instances.lock().push(id.clone(), component);
        if let Some((evicted_id, _)) = evicted.filter(|(evicted_id, _)| *evicted_id != id) {
            debug!(component_id = %evicted_id, "evicted instance");
            self.prune_lock(&evicted_id);
        }
    }

    /// Serialized attributes of the cached instance for `id`.
    pub fn attributes(&self, id: &str) -> Option<Map<String, Value>> {
        self.instances.lock().peek(id).map(|component| component.attributes())
    }

    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of ids with a live lock entry.
    pub fn lock_entries(&self) -> usize {
        self.locks.lock().len()
    }

    /// Drop the lock entry for `id` unless a request still holds or awaits it.
    fn prune_lock(&self, id: &str) {
        let mut locks = self.locks.lock();
        // Clones are only made under `locks`, so a count of one cannot grow here.
        if locks.get(id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            locks.remove(id);
        }
    }
}

/// Exclusive access to one component id; released on drop.
pub struct IdGuard<'a> {
    cache: &'a InstanceCache,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.cache.prune_lock(&self.id);
    }
}

/// [`ComponentFactory`] that serves cached instances and builds missing ones
/// from the registry.
pub struct CachedFactory<'a> {
    cache: &'a InstanceCache,
    registry: &'a Registry,
}

impl<'a> CachedFactory<'a> {
    pub fn new(cache: &'a InstanceCache, registry: &'a Registry) -> Self {
        Self { cache, registry }
    }
}

impl ComponentFactory for CachedFactory<'_> {
    fn create(&self, id: &str, name: &str, skip_cache: bool) -> Result<Box<dyn Component>> {
        if !skip_cache {
            match self.cache.take(id) {
                Some(component) if component.name() == name => {
                    debug!(component_id = id, "cache hit");
                    return Ok(component);
                }
                Some(stale) => {
                    debug!(component_id = id, cached = stale.name(), requested = name, "dropping instance of another component");
                }
                None => {}
            }
        }
        debug!(component_id = id, component = name, skip_cache, "building instance");
        self.registry.build(name, id)
    }

    fn release(&self, component: Box<dyn Component>) {
        self.cache.put(component);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor::core::state::Fields;
    use serde_json::json;

    #[test]
    fn create_prefers_cached_instance_unless_skipped() {
        let cache = InstanceCache::default();
        let registry = Registry::with_defaults();
        let factory = CachedFactory::new(&cache, &registry);

        let mut first = factory.create("c-1", "counter", false).expect("create");
        first.call_method("increment", Vec::new()).expect("increment");
        factory.release(first);

        let cached = factory.create("c-1", "counter", false).expect("cached");
        assert_eq!(cached.get_field("count"), Some(json!(1)));
        factory.release(cached);

        let fresh = factory.create("c-1", "counter", true).expect("fresh");
        assert_eq!(fresh.get_field("count"), Some(json!(0)));
    }

    #[test]
    fn cached_instance_of_another_component_is_replaced() {
        let cache = InstanceCache::default();
        let registry = Registry::with_defaults();
        let factory = CachedFactory::new(&cache, &registry);

        factory.release(factory.create("x-1", "counter", false).expect("counter"));
        let hello = factory.create("x-1", "hello-world", false).expect("hello");
        assert_eq!(hello.name(), "hello-world");
        assert!(cache.is_empty());
    }

    #[test]
    fn full_cache_evicts_least_recently_used() {
        let cache = InstanceCache::with_capacity(NonZeroUsize::new(2).expect("non-zero"));
        let registry = Registry::with_defaults();
        let factory = CachedFactory::new(&cache, &registry);

        for id in ["c-1", "c-2"] {
            factory.release(factory.create(id, "counter", false).expect("create"));
        }
        // Touch c-1 so c-2 becomes the eviction candidate.
        factory.release(factory.create("c-1", "counter", false).expect("cached"));
        factory.release(factory.create("c-3", "counter", false).expect("create"));

        assert_eq!(cache.len(), 2);
        assert!(cache.attributes("c-1").is_some());
        assert!(cache.attributes("c-2").is_none());
        assert!(cache.attributes("c-3").is_some());
    }

    #[tokio::test]
    async fn lock_entries_are_dropped_when_released() {
        let cache = InstanceCache::default();
        for index in 0..50 {
            let _guard = cache.lock(&format!("x-{index}")).await;
        }
        assert_eq!(cache.lock_entries(), 0);

        let guard = cache.lock("c-1").await;
        assert_eq!(cache.lock_entries(), 1);
        drop(guard);
        assert_eq!(cache.lock_entries(), 0);
    }

    #[tokio::test]
    async fn lock_serializes_same_id() {
        let cache = Arc::new(InstanceCache::default());
        let guard = cache.lock("c-1").await;

        let contended = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let _guard = cache.lock("c-1").await;
            })
        };
        let other = cache.lock("c-2").await;
        drop(other);

        tokio::task::yield_now().await;
        assert!(!contended.is_finished());
        // The waiting task keeps the entry alive after the holder lets go.
        drop(guard);
        contended.await.expect("join");
        assert_eq!(cache.lock_entries(), 0);
    }
}
