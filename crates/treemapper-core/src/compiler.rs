//! Walks a template tree into an executable [`Plan`].
//!
//! Classification rules:
//! - a scalar string matching `{{ … }}` end to end becomes an
//!   expression leaf (compiled through the expression cache)
//! - a map carrying reserved operator keys and/or a `"*"` key becomes a
//!   wildcard block: operator keys are stripped into `OperatorCall`s in
//!   declared order, the `"*"` entry is the row body, and remaining
//!   plain keys merge into the body map (explicit `"*"` fields win)
//! - dotted or wildcard map keys address the target by path
//! - everything else recurses structurally
//!
//! Compiled plans are cached per (template content hash, operator
//! registry version) in a class-scoped LRU.

use std::sync::Arc;

use once_cell::sync::Lazy;

use mapper_cache::{canonical_bytes, hash_bytes, register_clearable, CacheStats, ClassScopedCache};
use template_parser::{is_expression, ExpressionParser};
use tree_types::{Path, Value};

use crate::error::MapperError;
use crate::operators;
use crate::plan::{MapEntryKey, OperatorCall, Plan};

/// Owner key of the compiler's plan cache.
pub const PLAN_CACHE_OWNER: &str = "TemplateCompiler";

static PLAN_CACHE: Lazy<ClassScopedCache<Arc<Plan>>> = Lazy::new(|| {
    register_clearable(
        "template-compiler",
        std::sync::Arc::new(TemplateCompiler::clear_cache),
    );
    ClassScopedCache::new(mapper_cache::DEFAULT_CLASS_CAPACITY)
});

/// Compiles templates into cached plans.
pub struct TemplateCompiler;

impl TemplateCompiler {
    /// Compiles through the plan cache.
    pub fn compile(template: &Value) -> Result<Arc<Plan>, MapperError> {
        let mut key_bytes = canonical_bytes(template);
        key_bytes.extend_from_slice(&operators::registry_version().to_le_bytes());
        let key = hash_bytes(&key_bytes);

        if let Some(hit) = PLAN_CACHE.get(PLAN_CACHE_OWNER, key) {
            tracing::trace!("plan cache hit");
            return Ok(hit);
        }

        tracing::debug!("compiling template plan");
        let plan = Arc::new(compile_value(template)?);
        PLAN_CACHE.put(PLAN_CACHE_OWNER, key, Arc::clone(&plan));
        Ok(plan)
    }

    /// Statistics of the compiler's plan cache.
    pub fn cache_stats() -> Option<CacheStats> {
        PLAN_CACHE.class_stats(PLAN_CACHE_OWNER)
    }

    pub fn clear_cache() {
        PLAN_CACHE.clear_class(PLAN_CACHE_OWNER);
    }
}

fn compile_value(template: &Value) -> Result<Plan, MapperError> {
    match template {
        Value::String(text) if is_expression(text) => {
            let ir = ExpressionParser::parse(text)
                .map_err(|e| MapperError::from_parse(e, text))?;
            Ok(Plan::Expression(ir))
        }
        Value::Map(entries) => {
            let is_block = entries.contains_key("*")
                || entries.keys().any(|k| operators::is_operator_key(k));
            if is_block {
                compile_block(entries)
            } else {
                let mut compiled = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    compiled.push((classify_key(key), compile_value(value)?));
                }
                Ok(Plan::Map(compiled))
            }
        }
        Value::Seq(items) => {
            let mut compiled = Vec::with_capacity(items.len());
            for item in items {
                compiled.push(compile_value(item)?);
            }
            Ok(Plan::Seq(compiled))
        }
        other => Ok(Plan::Literal(other.clone())),
    }
}

fn compile_block(entries: &indexmap::IndexMap<String, Value>) -> Result<Plan, MapperError> {
    let mut operator_calls = Vec::new();
    let mut star_body: Option<Plan> = None;
    let mut residual: Vec<(MapEntryKey, Plan)> = Vec::new();

    for (key, value) in entries {
        if key == "*" {
            star_body = Some(compile_value(value)?);
        } else if operators::is_operator_key(key) {
            operator_calls.push(OperatorCall {
                name: key.clone(),
                config: value.clone(),
            });
        } else if looks_like_operator_key(key) {
            return Err(MapperError::UnknownOperator { name: key.clone() });
        } else {
            residual.push((classify_key(key), compile_value(value)?));
        }
    }

    let body = match (star_body, residual) {
        (Some(Plan::Map(star_entries)), residual) if !residual.is_empty() => {
            // Residual fields become part of each row; `"*"` wins on
            // duplicate keys because it is inserted later.
            let mut merged = residual;
            merged.extend(star_entries);
            Plan::Map(merged)
        }
        (Some(star), residual) => {
            if !residual.is_empty() {
                tracing::debug!(
                    dropped = residual.len(),
                    "non-map row body; dropping residual block fields"
                );
            }
            star
        }
        (None, residual) => Plan::Map(residual),
    };

    Ok(Plan::WildcardBlock {
        operators: operator_calls,
        body: Box::new(body),
    })
}

/// Inside a block, an all-caps key that is not registered is a typo'd
/// or unregistered operator rather than an output field.
fn looks_like_operator_key(key: &str) -> bool {
    key.len() >= 3
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '_')
}

fn classify_key(key: &str) -> MapEntryKey {
    if key.contains('.') || key.contains('*') {
        if let Ok(path) = Path::parse(key) {
            if path.len() > 1 || path.has_wildcard() {
                return MapEntryKey::Path(path);
            }
        }
    }
    MapEntryKey::Field(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(template: serde_json::Value) -> Plan {
        compile_value(&Value::from(template)).unwrap()
    }

    #[test]
    fn strings_with_expressions_become_leaves() {
        let plan = compile(serde_json::json!("{{ user.name | trim }}"));
        assert!(matches!(plan, Plan::Expression(_)));

        let plan = compile(serde_json::json!("prefix {{ user.name }}"));
        assert!(matches!(plan, Plan::Literal(_)));
    }

    #[test]
    fn plain_maps_recurse() {
        let plan = compile(serde_json::json!({
            "name": "{{ user.name }}",
            "static": 42
        }));
        match plan {
            Plan::Map(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(matches!(entries[0].0, MapEntryKey::Field(ref f) if f == "name"));
                assert!(matches!(entries[0].1, Plan::Expression(_)));
                assert!(matches!(entries[1].1, Plan::Literal(_)));
            }
            other => panic!("expected map plan, got {}", other.kind()),
        }
    }

    #[test]
    fn dotted_keys_become_target_paths() {
        let plan = compile(serde_json::json!({
            "contact.name": "{{ user.name }}"
        }));
        match plan {
            Plan::Map(entries) => {
                assert!(matches!(entries[0].0, MapEntryKey::Path(_)));
            }
            other => panic!("expected map plan, got {}", other.kind()),
        }
    }

    #[test]
    fn star_key_makes_a_block() {
        let plan = compile(serde_json::json!({
            "*": { "n": "{{ products.*.name }}" }
        }));
        match plan {
            Plan::WildcardBlock { operators, body } => {
                assert!(operators.is_empty());
                assert!(matches!(*body, Plan::Map(_)));
            }
            other => panic!("expected block, got {}", other.kind()),
        }
    }

    #[test]
    fn operator_keys_are_stripped_in_declared_order() {
        let plan = compile(serde_json::json!({
            "LIMIT": 2,
            "WHERE": { "{{ products.*.category }}": "Electronics" },
            "*": { "n": "{{ products.*.name }}" }
        }));
        match plan {
            Plan::WildcardBlock { operators, .. } => {
                let names: Vec<&str> = operators.iter().map(|o| o.name.as_str()).collect();
                assert_eq!(names, vec!["LIMIT", "WHERE"]);
            }
            other => panic!("expected block, got {}", other.kind()),
        }
    }

    #[test]
    fn residual_fields_merge_into_the_row_body() {
        let plan = compile(serde_json::json!({
            "WHERE": { "{{ products.*.category }}": "Electronics" },
            "n": "{{ products.*.name }}"
        }));
        match plan {
            Plan::WildcardBlock { body, .. } => match *body {
                Plan::Map(entries) => assert_eq!(entries.len(), 1),
                other => panic!("expected map body, got {}", other.kind()),
            },
            other => panic!("expected block, got {}", other.kind()),
        }
    }

    #[test]
    fn unregistered_all_caps_key_is_unknown_operator() {
        let err = compile_value(&Value::from(serde_json::json!({
            "*": { "n": "{{ products.*.name }}" },
            "EVEN_IDS_TYPO": true
        })))
        .unwrap_err();
        assert!(matches!(err, MapperError::UnknownOperator { .. }));
    }

    #[test]
    fn compile_is_cached_by_content() {
        let template = Value::from(serde_json::json!({ "plan-cache-probe": "{{ a.b }}" }));
        // Operator registrations in sibling tests bump the registry
        // version (a new cache key); some adjacent pair of compiles is
        // guaranteed to land on one version.
        let compiles: Vec<_> = (0..4)
            .map(|_| TemplateCompiler::compile(&template).unwrap())
            .collect();
        assert!(compiles.windows(2).any(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(TemplateCompiler::cache_stats().unwrap().size >= 1);
    }

    #[test]
    fn operator_registration_invalidates_cached_plans() {
        let template = Value::from(serde_json::json!({
            "*": { "n": "{{ products.*.name }}" },
            "KEEP_ALL_ROWS": true
        }));

        // Unregistered: the all-caps key is rejected.
        assert!(TemplateCompiler::compile(&template).is_err());

        operators::register_operator("KEEP_ALL_ROWS", |rows, _, _| Ok(rows));

        // Same template compiles now; the version-salted key prevents a
        // stale cache hit (errors are not cached, but a prior success
        // compiled against another registry would be).
        let plan = TemplateCompiler::compile(&template).unwrap();
        match &*plan {
            Plan::WildcardBlock { operators, .. } => {
                assert_eq!(operators[0].name, "KEEP_ALL_ROWS");
            }
            other => panic!("expected block, got {}", other.kind()),
        }
    }
}
