//! Wildcard operator registry.
//!
//! `WHERE`, `ORDER BY`, `LIMIT`, and `OFFSET` are built-in phases of the
//! executor; everything else — including the shipped `DISTINCT` and
//! `GROUP BY` — goes through this registry and runs in textual order of
//! first appearance in the template. Operators must be deterministic and
//! return a new bag; they never mutate rows in place.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use mapper_cache::content_hash;
use template_parser::{is_expression, ExpressionParser};
use tree_types::{accessor, Path, Segment, Value};

use crate::error::MapperError;
use crate::filters::{self, FilterResult};
use crate::rows::{RowKey, RowKind, RowSet};

/// Operator keys handled directly by the executor's canonical phases.
pub const BUILTIN_OPERATOR_KEYS: [&str; 4] = ["WHERE", "ORDER BY", "LIMIT", "OFFSET"];

/// Read-only view an operator receives for resolving `{{ … }}`
/// references inside its configuration.
pub struct OperatorCtx<'a> {
    sources: &'a Value,
    bindings: &'a [Segment],
}

impl<'a> OperatorCtx<'a> {
    pub fn new(sources: &'a Value, bindings: &'a [Segment]) -> Self {
        Self { sources, bindings }
    }

    /// The full source root (a map of source name to value).
    pub fn sources(&self) -> &Value {
        self.sources
    }

    /// Resolves an expression or plain path from the operator config.
    ///
    /// Wildcards are bound left to right: first to the enclosing blocks'
    /// bindings, then — if `key` is given — to the row being examined.
    pub fn resolve(&self, expr: &str, key: Option<&RowKey>) -> Result<Value, MapperError> {
        let text = expr.trim();

        let (path, filters, default) = if is_expression(text) {
            let ir = ExpressionParser::parse(text)
                .map_err(|e| MapperError::from_parse(e, text))?;
            (ir.path.clone(), ir.filters.clone(), ir.default.clone())
        } else {
            (Path::parse(text)?, Vec::new(), None)
        };

        let mut bound = path;
        for binding in self.bindings {
            match bound.bind_first_wildcard(binding.clone()) {
                Some(next) => bound = next,
                None => break,
            }
        }
        if let Some(key) = key {
            if let Some(next) = bound.bind_first_wildcard(key.segment()) {
                bound = next;
            }
        }

        let mut value = accessor::get(self.sources, &bound, &Value::Null);
        if !filters.is_empty() {
            value = match filters::global().apply(value, &filters, text)? {
                FilterResult::Value(v) => v,
                FilterResult::Absent => Value::Null,
            };
        }
        if value.is_null() {
            if let Some(fallback) = default {
                return Ok(fallback);
            }
        }
        Ok(value)
    }
}

/// A registered operator: transforms a bag of rows under a config.
pub type OperatorFn =
    Arc<dyn Fn(RowSet, &Value, &OperatorCtx) -> Result<RowSet, MapperError> + Send + Sync>;

static OPERATORS: Lazy<RwLock<HashMap<String, OperatorFn>>> = Lazy::new(|| {
    let mut map: HashMap<String, OperatorFn> = HashMap::new();
    map.insert("DISTINCT".to_string(), Arc::new(distinct));
    map.insert("GROUP BY".to_string(), Arc::new(group_by));
    RwLock::new(map)
});

/// Bumped on every registration; part of the plan cache key so cached
/// plans never outlive the registry they were compiled against.
static VERSION: AtomicU64 = AtomicU64::new(0);

/// Registers (or replaces) an operator under `name`.
pub fn register_operator<F>(name: &str, operator: F)
where
    F: Fn(RowSet, &Value, &OperatorCtx) -> Result<RowSet, MapperError> + Send + Sync + 'static,
{
    OPERATORS
        .write()
        .expect("operator registry poisoned")
        .insert(name.to_string(), Arc::new(operator));
    VERSION.fetch_add(1, Ordering::SeqCst);
}

/// Current registry version.
pub fn registry_version() -> u64 {
    VERSION.load(Ordering::SeqCst)
}

pub fn lookup(name: &str) -> Option<OperatorFn> {
    OPERATORS
        .read()
        .expect("operator registry poisoned")
        .get(name)
        .cloned()
}

pub fn is_registered(name: &str) -> bool {
    OPERATORS
        .read()
        .expect("operator registry poisoned")
        .contains_key(name)
}

/// True if `key` delimits operator behaviour in a template map.
pub fn is_operator_key(key: &str) -> bool {
    BUILTIN_OPERATOR_KEYS.contains(&key) || is_registered(key)
}

// ── Shipped operators ──

/// `DISTINCT` — keeps the first row per projection.
///
/// Config `true` (or null) dedupes by whole row content; a string config
/// dedupes by the resolved projection.
fn distinct(rows: RowSet, config: &Value, ctx: &OperatorCtx) -> Result<RowSet, MapperError> {
    let projection = config.as_str();

    let mut seen: Vec<u128> = Vec::new();
    let mut out = RowSet::new(rows.kind);
    for row in rows.rows {
        let discriminant = match projection {
            Some(expr) => ctx.resolve(expr, Some(&row.key))?,
            None => row.value.clone(),
        };
        let hash = content_hash(&discriminant);
        if !seen.contains(&hash) {
            seen.push(hash);
            out.rows.push(row);
        }
    }
    Ok(out)
}

/// `GROUP BY` — buckets rows by a projection.
///
/// The result is a Map-kind bag: one row per distinct projection value,
/// each holding the Seq of member row values in encounter order.
fn group_by(rows: RowSet, config: &Value, ctx: &OperatorCtx) -> Result<RowSet, MapperError> {
    let projection = config.as_str().ok_or_else(|| MapperError::InvalidPath {
        path: config.to_string(),
        reason: "GROUP BY config must be a path or expression string".to_string(),
    })?;

    let mut groups: indexmap::IndexMap<String, Vec<Value>> = indexmap::IndexMap::new();
    for row in rows.rows {
        let key_value = ctx.resolve(projection, Some(&row.key))?;
        let group_key = match &key_value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        groups.entry(group_key).or_default().push(row.value);
    }

    let mut out = RowSet::new(RowKind::Map);
    for (key, members) in groups {
        out.push(RowKey::Key(key), Value::Seq(members));
    }
    Ok(out)
}
