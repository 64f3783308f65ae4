//! Bounded caches with content-hash invalidation.
//!
//! # Architecture
//!
//! - **[`hash`]** — canonical xxh128 hashing (sorted map keys,
//!   length-prefixed strings); the only hash used for cache keys
//! - **[`LruMemo`]** — a mutex-guarded LRU keyed by content hash
//! - **[`ClassScopedCache`]** — one LRU per owner key
//! - **[`HashValidatedCache`]** — remember(owner, slot, input, compute)
//!   with recompute-on-hash-change
//! - **[`CacheHelper`]** — clears every registered cache at once
//!
//! Eviction is LRU everywhere; statistics (size, bound, usage) are
//! observable per cache.

pub mod class_scoped;
pub mod hash;
pub mod hash_validated;
pub mod helper;
pub mod lru_memo;
pub mod stats;

pub use class_scoped::{ClassScopedCache, DEFAULT_CLASS_CAPACITY};
pub use hash::{canonical_bytes, content_hash, hash_bytes, hash_str};
pub use hash_validated::HashValidatedCache;
pub use helper::{register_clearable, CacheHelper};
pub use lru_memo::LruMemo;
pub use stats::CacheStats;
