//! Named, pure filters and the pipeline engine that applies them.
//!
//! Filters are total functions over [`Value`]. Application is left to
//! right; each stage's output is the next stage's input. Scalar filters
//! broadcast elementwise over wildcard-shaped Seq/Map inputs; filters
//! registered as sequence-aware receive the container itself.
//!
//! A filter may return [`FilterResult::Absent`], which skips the
//! remaining stages and makes the leaf fall back to its `??` default
//! (or be omitted).

pub mod builtin;
pub mod coerce;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use template_parser::FilterCall;
use tree_types::Value;

use crate::error::MapperError;

/// Outcome of one filter stage.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterResult {
    Value(Value),
    /// Sentinel: drop this leaf and fall back to the default.
    Absent,
}

/// A registered filter: pure function from input + args to outcome.
pub type FilterFn =
    Arc<dyn Fn(&Value, &[Value]) -> Result<FilterResult, MapperError> + Send + Sync>;

#[derive(Clone)]
struct FilterEntry {
    func: FilterFn,
    seq_aware: bool,
}

/// Registry mapping filter names to implementations.
///
/// Process-wide after initialization; registrations are expected at
/// startup. Reads take the lock briefly and clone the `Arc`.
pub struct FilterRegistry {
    entries: RwLock<HashMap<String, FilterEntry>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry pre-seeded with the built-in filters.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        builtin::register_builtins(&registry);
        registry
    }

    /// Registers (or replaces) a filter.
    pub fn register<F>(&self, name: &str, seq_aware: bool, func: F)
    where
        F: Fn(&Value, &[Value]) -> Result<FilterResult, MapperError> + Send + Sync + 'static,
    {
        self.entries.write().expect("filter registry poisoned").insert(
            name.to_string(),
            FilterEntry {
                func: Arc::new(func),
                seq_aware,
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .expect("filter registry poisoned")
            .contains_key(name)
    }

    /// Registered filter names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .expect("filter registry poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn entry(&self, name: &str) -> Option<FilterEntry> {
        self.entries
            .read()
            .expect("filter registry poisoned")
            .get(name)
            .cloned()
    }

    /// Runs a pipeline over `value`.
    ///
    /// `leaf_source` is the expression text, attached to diagnostics.
    pub fn apply(
        &self,
        value: Value,
        calls: &[FilterCall],
        leaf_source: &str,
    ) -> Result<FilterResult, MapperError> {
        let mut current = value;
        for call in calls {
            let entry = self.entry(&call.name).ok_or_else(|| MapperError::UnknownFilter {
                name: call.name.clone(),
                snippet: leaf_source.to_string(),
            })?;
            match apply_entry(&entry, current, &call.args)? {
                FilterResult::Value(next) => current = next,
                FilterResult::Absent => return Ok(FilterResult::Absent),
            }
        }
        Ok(FilterResult::Value(current))
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Applies one filter, broadcasting scalar filters over containers.
fn apply_entry(
    entry: &FilterEntry,
    value: Value,
    args: &[Value],
) -> Result<FilterResult, MapperError> {
    if entry.seq_aware {
        return (entry.func)(&value, args);
    }

    match value {
        Value::Seq(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(flatten_absent(apply_entry(entry, item, args)?));
            }
            Ok(FilterResult::Value(Value::Seq(out)))
        }
        Value::Map(entries) => {
            let mut out = indexmap::IndexMap::with_capacity(entries.len());
            for (key, item) in entries {
                out.insert(key, flatten_absent(apply_entry(entry, item, args)?));
            }
            Ok(FilterResult::Value(Value::Map(out)))
        }
        scalar => (entry.func)(&scalar, args),
    }
}

/// Inside a broadcast, an element-level Absent degrades to Null.
fn flatten_absent(result: FilterResult) -> Value {
    match result {
        FilterResult::Value(v) => v,
        FilterResult::Absent => Value::Null,
    }
}

static GLOBAL: Lazy<FilterRegistry> = Lazy::new(FilterRegistry::with_builtins);

/// The process-wide filter registry.
pub fn global() -> &'static FilterRegistry {
    &GLOBAL
}

/// Registers a scalar filter in the global registry.
pub fn register_filter<F>(name: &str, func: F)
where
    F: Fn(&Value, &[Value]) -> Result<FilterResult, MapperError> + Send + Sync + 'static,
{
    global().register(name, false, func);
}

/// Registers a sequence-aware filter in the global registry.
pub fn register_seq_filter<F>(name: &str, func: F)
where
    F: Fn(&Value, &[Value]) -> Result<FilterResult, MapperError> + Send + Sync + 'static,
{
    global().register(name, true, func);
}
