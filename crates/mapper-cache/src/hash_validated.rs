//! Hash-validated memoisation.
//!
//! `remember` stores `(hash(input), result)` per slot and recomputes only
//! when the input's content hash diverges from the stored one. This gives
//! automatic invalidation when a source artefact changes, without the
//! caller tracking versions.

use std::collections::HashMap;
use std::sync::Mutex;

use tree_types::Value;

use crate::hash::content_hash;

/// A generic "remember(owner, slot, input, compute)" memo.
pub struct HashValidatedCache<V> {
    slots: Mutex<HashMap<(String, String), (u128, V)>>,
}

impl<V: Clone> HashValidatedCache<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached result for `(owner, slot)` while `input` hashes
    /// the same as it did when the result was stored; otherwise runs
    /// `compute` and stores the fresh result under the new hash.
    pub fn remember(
        &self,
        owner: &str,
        slot: &str,
        input: &Value,
        compute: impl FnOnce() -> V,
    ) -> V {
        let hash = content_hash(input);
        let key = (owner.to_string(), slot.to_string());

        {
            let slots = self.slots.lock().expect("cache lock poisoned");
            if let Some((stored_hash, stored_value)) = slots.get(&key) {
                if *stored_hash == hash {
                    return stored_value.clone();
                }
            }
        }

        // Compute outside the lock; deterministic computes make the
        // last-insert-wins race harmless.
        let value = compute();
        self.slots
            .lock()
            .expect("cache lock poisoned")
            .insert(key, (hash, value.clone()));
        value
    }

    /// Drops every slot belonging to `owner`.
    pub fn clear_owner(&self, owner: &str) {
        self.slots
            .lock()
            .expect("cache lock poisoned")
            .retain(|(slot_owner, _), _| slot_owner != owner);
    }

    /// Drops all slots.
    pub fn clear_all(&self) {
        self.slots.lock().expect("cache lock poisoned").clear();
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.slots.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for HashValidatedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_input_returns_cached_result() {
        let cache: HashValidatedCache<i64> = HashValidatedCache::new();
        let input = Value::from(serde_json::json!({ "a": 1 }));
        let mut calls = 0;

        let first = cache.remember("T", "k", &input, || {
            calls += 1;
            42
        });
        let second = cache.remember("T", "k", &input, || {
            calls += 1;
            99
        });

        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn changed_input_recomputes() {
        let cache: HashValidatedCache<i64> = HashValidatedCache::new();
        let mut calls = 0;

        let first = cache.remember("T", "k", &Value::from(serde_json::json!({ "a": 1 })), || {
            calls += 1;
            1
        });
        let second = cache.remember("T", "k", &Value::from(serde_json::json!({ "a": 2 })), || {
            calls += 1;
            2
        });

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(calls, 2);
    }

    #[test]
    fn key_order_does_not_invalidate() {
        let cache: HashValidatedCache<i64> = HashValidatedCache::new();
        let mut calls = 0;

        let a = Value::from(serde_json::json!({ "x": 1, "y": 2 }));
        let mut b = Value::map();
        {
            let entries = b.as_map_mut().unwrap();
            entries.insert("y".to_string(), Value::Int(2));
            entries.insert("x".to_string(), Value::Int(1));
        }

        cache.remember("T", "k", &a, || {
            calls += 1;
            7
        });
        let second = cache.remember("T", "k", &b, || {
            calls += 1;
            8
        });

        assert_eq!(second, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn clear_owner_is_scoped() {
        let cache: HashValidatedCache<i64> = HashValidatedCache::new();
        let input = Value::Int(1);
        cache.remember("A", "k", &input, || 1);
        cache.remember("B", "k", &input, || 2);

        cache.clear_owner("A");
        assert_eq!(cache.len(), 1);

        let mut recomputed = false;
        cache.remember("A", "k", &input, || {
            recomputed = true;
            3
        });
        assert!(recomputed);
    }
}
