//! Cache behaviour visible through the public API.
//!
//! Stats-asserting steps share the process-wide caches, so they run as
//! one sequential test to stay independent of test-thread interleaving.

use mapper_cache::{CacheHelper, HashValidatedCache};
use template_parser::ExpressionParser;
use tree_types::Value;
use treemapper_core::{query, TemplateCompiler};

fn json(v: serde_json::Value) -> Value {
    Value::from(v)
}

fn run_mapping() -> Value {
    query()
        .source(
            "order",
            json(serde_json::json!({
                "id": "A-1",
                "lines": [ { "sku": "x", "qty": 2 }, { "sku": "y", "qty": 1 } ]
            })),
        )
        .template(json(serde_json::json!({
            "id": "{{ order.id }}",
            "lines": { "*": { "sku": "{{ order.lines.*.sku | upper }}" } }
        })))
        .map()
        .unwrap()
}

// One test owns the process-wide caches; splitting it would race under
// the parallel test runner.
#[test]
fn caches_are_transparent_and_observable() {
    ExpressionParser::clear_cache();
    TemplateCompiler::clear_cache();

    let cold = run_mapping();
    let warm = run_mapping();
    assert_eq!(cold, warm);
    assert_eq!(
        cold,
        json(serde_json::json!({
            "id": "A-1",
            "lines": [ { "sku": "X" }, { "sku": "Y" } ]
        }))
    );

    // Warm caches are observable.
    let stats = ExpressionParser::cache_stats();
    assert!(stats.size >= 2, "expected cached leaves, got {}", stats.size);
    assert!(stats.max_size >= stats.size);
    assert!(stats.usage_pct() > 0.0);

    let plan_stats = TemplateCompiler::cache_stats().expect("plan cache exists after a compile");
    assert!(plan_stats.size >= 1);

    // Every global cache is registered for the blanket clear, and a
    // cleared cache still produces the same mapping.
    let registered = CacheHelper::registered();
    assert!(registered.contains(&"expression-parser".to_string()));
    assert!(registered.contains(&"template-compiler".to_string()));

    CacheHelper::clear_all();
    assert_eq!(ExpressionParser::cache_stats().size, 0);
    let recold = run_mapping();
    assert_eq!(cold, recold);
}

#[test]
fn hash_validated_memo_invalidates_on_input_change() {
    let cache: HashValidatedCache<Value> = HashValidatedCache::new();
    let mut calls = 0;

    let input = json(serde_json::json!({ "a": 1 }));
    let first = cache.remember("T", "k", &input, || {
        calls += 1;
        Value::from("computed-1")
    });
    assert_eq!(first, Value::from("computed-1"));

    // Identical map: cached result, closure not invoked.
    let same = json(serde_json::json!({ "a": 1 }));
    let second = cache.remember("T", "k", &same, || {
        calls += 1;
        Value::from("computed-2")
    });
    assert_eq!(second, Value::from("computed-1"));
    assert_eq!(calls, 1);

    // Changed input: recompute.
    let changed = json(serde_json::json!({ "a": 2 }));
    let third = cache.remember("T", "k", &changed, || {
        calls += 1;
        Value::from("computed-3")
    });
    assert_eq!(third, Value::from("computed-3"));
    assert_eq!(calls, 2);
}
