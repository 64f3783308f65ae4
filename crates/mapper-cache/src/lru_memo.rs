//! Bounded LRU memo keyed by content hash.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::stats::CacheStats;

/// A mutex-guarded LRU cache keyed by a 128-bit content hash.
///
/// Values are cloned out on hit; callers store `Arc`s for anything
/// non-trivial so the lock is never held while the value is in use.
pub struct LruMemo<V> {
    inner: Mutex<LruCache<u128, V>>,
}

impl<V: Clone> LruMemo<V> {
    /// Creates a memo bounded to `max_entries` (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity(max_entries))),
        }
    }

    /// Looks up a key, refreshing its recency on hit.
    pub fn get(&self, key: u128) -> Option<V> {
        self.inner.lock().expect("cache lock poisoned").get(&key).cloned()
    }

    /// Inserts a value, evicting the least recently used entry if full.
    pub fn put(&self, key: u128, value: V) {
        self.inner.lock().expect("cache lock poisoned").put(key, value);
    }

    /// Returns the cached value or computes and caches it.
    ///
    /// The lock is released while `compute` runs; a concurrent computation
    /// of the same key wins by last insert, which is harmless because
    /// computed values are deterministic in this workspace.
    pub fn get_or_insert_with(&self, key: u128, compute: impl FnOnce() -> V) -> V {
        if let Some(hit) = self.get(key) {
            tracing::trace!("cache hit");
            return hit;
        }
        tracing::trace!("cache miss");
        let value = compute();
        self.put(key, value.clone());
        value
    }

    pub fn stats(&self) -> CacheStats {
        let guard = self.inner.lock().expect("cache lock poisoned");
        CacheStats {
            size: guard.len(),
            max_size: guard.cap().get(),
        }
    }

    pub fn clear(&self) {
        self.inner.lock().expect("cache lock poisoned").clear();
    }

    /// Changes the bound, evicting LRU entries if shrinking.
    pub fn resize(&self, max_entries: usize) {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .resize(capacity(max_entries));
    }
}

fn capacity(max_entries: usize) -> NonZeroUsize {
    NonZeroUsize::new(max_entries.max(1)).expect("capacity is at least 1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_insert_computes_once() {
        let memo: LruMemo<String> = LruMemo::new(4);
        let mut calls = 0;

        let first = memo.get_or_insert_with(1, || {
            calls += 1;
            "a".to_string()
        });
        let second = memo.get_or_insert_with(1, || {
            calls += 1;
            "b".to_string()
        });

        assert_eq!(first, "a");
        assert_eq!(second, "a");
        assert_eq!(calls, 1);
    }

    #[test]
    fn lru_evicts_oldest() {
        let memo: LruMemo<u32> = LruMemo::new(2);
        memo.put(1, 10);
        memo.put(2, 20);
        // Touch 1 so 2 becomes the eviction candidate.
        assert_eq!(memo.get(1), Some(10));
        memo.put(3, 30);

        assert_eq!(memo.get(1), Some(10));
        assert_eq!(memo.get(2), None);
        assert_eq!(memo.get(3), Some(30));
    }

    #[test]
    fn stats_track_size_and_bound() {
        let memo: LruMemo<u32> = LruMemo::new(10);
        memo.put(1, 1);
        memo.put(2, 2);

        let stats = memo.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 10);
        assert!((stats.usage_pct() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_empties_the_memo() {
        let memo: LruMemo<u32> = LruMemo::new(4);
        memo.put(1, 1);
        memo.clear();
        assert_eq!(memo.stats().size, 0);
        assert_eq!(memo.get(1), None);
    }

    #[test]
    fn resize_shrinks_with_eviction() {
        let memo: LruMemo<u32> = LruMemo::new(4);
        for i in 0..4 {
            memo.put(i, i as u32);
        }
        memo.resize(2);
        assert_eq!(memo.stats().max_size, 2);
        assert_eq!(memo.stats().size, 2);
    }
}
