//! Workspace-wide cache clearing.
//!
//! Global caches live in different crates (expression cache in the
//! parser, plan cache in the mapper core). Each registers a named clear
//! hook here so `CacheHelper::clear_all()` can empty every cache without
//! this crate knowing their concrete types.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

type ClearFn = Arc<dyn Fn() + Send + Sync>;

static CLEARABLES: Lazy<Mutex<Vec<(String, ClearFn)>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Registers (or replaces) a named clear hook.
pub fn register_clearable(name: &str, clear: ClearFn) {
    let mut hooks = CLEARABLES.lock().expect("clearable registry poisoned");
    if let Some(existing) = hooks.iter_mut().find(|(n, _)| n == name) {
        existing.1 = clear;
    } else {
        hooks.push((name.to_string(), clear));
    }
}

/// Entry point for clearing every registered cache at once.
pub struct CacheHelper;

impl CacheHelper {
    /// Invokes every registered clear hook.
    pub fn clear_all() {
        let hooks: Vec<(String, ClearFn)> = {
            let guard = CLEARABLES.lock().expect("clearable registry poisoned");
            guard.clone()
        };
        for (name, clear) in hooks {
            tracing::debug!(cache = %name, "clearing cache");
            clear();
        }
    }

    /// Names of all registered caches.
    pub fn registered() -> Vec<String> {
        CLEARABLES
            .lock()
            .expect("clearable registry poisoned")
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}
