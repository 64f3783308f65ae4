//! Per-owner LRU caches.
//!
//! One independent LRU per owner key (e.g. a compiler instance name), so
//! a hot owner cannot evict a quiet owner's entries.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::stats::CacheStats;

/// Default per-owner bound.
pub const DEFAULT_CLASS_CAPACITY: usize = 100;

/// A family of bounded LRU caches, one per owner key.
pub struct ClassScopedCache<V> {
    classes: Mutex<HashMap<String, LruCache<u128, V>>>,
    per_class_capacity: NonZeroUsize,
}

impl<V: Clone> ClassScopedCache<V> {
    pub fn new(per_class_capacity: usize) -> Self {
        Self {
            classes: Mutex::new(HashMap::new()),
            per_class_capacity: NonZeroUsize::new(per_class_capacity.max(1))
                .expect("capacity is at least 1"),
        }
    }

    /// Looks up `key` in the owner's cache.
    pub fn get(&self, owner: &str, key: u128) -> Option<V> {
        let mut classes = self.classes.lock().expect("cache lock poisoned");
        classes.get_mut(owner)?.get(&key).cloned()
    }

    /// Inserts into the owner's cache, creating it on first use.
    pub fn put(&self, owner: &str, key: u128, value: V) {
        let mut classes = self.classes.lock().expect("cache lock poisoned");
        classes
            .entry(owner.to_string())
            .or_insert_with(|| LruCache::new(self.per_class_capacity))
            .put(key, value);
    }

    /// Returns the cached value or computes and caches it.
    pub fn get_or_insert_with(&self, owner: &str, key: u128, compute: impl FnOnce() -> V) -> V {
        if let Some(hit) = self.get(owner, key) {
            return hit;
        }
        let value = compute();
        self.put(owner, key, value.clone());
        value
    }

    /// Statistics for one owner's cache, if it exists.
    pub fn class_stats(&self, owner: &str) -> Option<CacheStats> {
        let classes = self.classes.lock().expect("cache lock poisoned");
        classes.get(owner).map(|cache| CacheStats {
            size: cache.len(),
            max_size: cache.cap().get(),
        })
    }

    /// All owner keys with a live cache.
    pub fn owners(&self) -> Vec<String> {
        let classes = self.classes.lock().expect("cache lock poisoned");
        let mut owners: Vec<String> = classes.keys().cloned().collect();
        owners.sort();
        owners
    }

    /// Drops one owner's cache entirely.
    pub fn clear_class(&self, owner: &str) {
        self.classes.lock().expect("cache lock poisoned").remove(owner);
    }

    /// Drops every owner's cache.
    pub fn clear_all(&self) {
        self.classes.lock().expect("cache lock poisoned").clear();
    }
}
