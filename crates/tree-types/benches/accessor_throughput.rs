//! Benchmarks for accessor reads and mutator writes.
//!
//! Run with: `cargo bench -p tree-types`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tree_types::{accessor, mutator, Path, Value};

/// A synthetic order tree with a few hundred line items.
fn synthetic_order(items: usize) -> Value {
    let lines: Vec<serde_json::Value> = (0..items)
        .map(|i| {
            serde_json::json!({
                "sku": format!("SKU-{i:05}"),
                "qty": (i % 7) + 1,
                "price": (i as f64) * 1.25,
                "meta": { "warehouse": "A", "lane": i % 12 }
            })
        })
        .collect();

    Value::from(serde_json::json!({
        "order": { "id": "ORD-1", "lines": lines }
    }))
}

fn bench_plain_get(c: &mut Criterion) {
    let root = synthetic_order(500);
    let path = Path::parse("order.lines.250.meta.warehouse").unwrap();

    c.bench_function("get_plain", |b| {
        b.iter(|| {
            let value = accessor::get(black_box(&root), &path, &Value::Null);
            black_box(value);
        });
    });
}

fn bench_wildcard_get(c: &mut Criterion) {
    let root = synthetic_order(500);
    let path = Path::parse("order.lines.*.sku").unwrap();

    c.bench_function("get_wildcard_500", |b| {
        b.iter(|| {
            let value = accessor::get(black_box(&root), &path, &Value::Null);
            black_box(value);
        });
    });
}

fn bench_set(c: &mut Criterion) {
    let root = synthetic_order(100);
    let path = Path::parse("order.lines.50.qty").unwrap();
    let value = Value::Int(99);

    c.bench_function("set_deep", |b| {
        b.iter(|| {
            let result = mutator::set(black_box(&root), &path, &value);
            black_box(result);
        });
    });
}

criterion_group!(benches, bench_plain_get, bench_wildcard_get, bench_set);
criterion_main!(benches);
