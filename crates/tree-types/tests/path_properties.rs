//! Property tests for the path engine and mutator.
//!
//! Run with: `cargo test -p tree-types`

use proptest::prelude::*;

use tree_types::{accessor, mutator, Path, Segment, Value};

/// Strategy for a well-formed segment.
fn segment_strategy() -> impl Strategy<Value = Segment> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,8}".prop_map(Segment::Key),
        (0usize..32).prop_map(Segment::Index),
        Just(Segment::Wildcard),
    ]
}

/// Strategy for a well-formed path (1..6 segments).
fn path_strategy() -> impl Strategy<Value = Path> {
    prop::collection::vec(segment_strategy(), 1..6).prop_map(Path::from_segments)
}

/// Strategy for a wildcard-free path, usable as a write target.
fn concrete_path_strategy() -> impl Strategy<Value = Path> {
    prop::collection::vec(
        prop_oneof![
            "[a-z][a-z0-9_]{0,8}".prop_map(Segment::Key),
            (0usize..8).prop_map(Segment::Index),
        ],
        1..5,
    )
    .prop_map(Path::from_segments)
}

/// Strategy for a small scalar value.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>()
            .prop_filter("NaN never equals itself", |f| !f.is_nan())
            .prop_map(Value::Float),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn parse_emit_roundtrip(path in path_strategy()) {
        let text = path.emit();
        let parsed = Path::parse(&text).unwrap();
        prop_assert_eq!(parsed, path);
    }

    #[test]
    fn accessor_never_panics(path in path_strategy(), scalar in scalar_strategy()) {
        let root = Value::from(serde_json::json!({
            "a": { "b": [1, 2, 3] },
            "items": [ { "name": "x" }, { "name": "y" } ]
        }));
        let _ = accessor::get(&root, &path, &scalar);
    }

    #[test]
    fn set_does_not_mutate_root(path in concrete_path_strategy(), value in scalar_strategy()) {
        let root = Value::from(serde_json::json!({ "seed": { "k": [1, 2] } }));
        let snapshot = root.clone();
        let _ = mutator::set(&root, &path, &value);
        prop_assert_eq!(root, snapshot);
    }

    #[test]
    fn set_is_idempotent(path in concrete_path_strategy(), value in scalar_strategy()) {
        let root = Value::from(serde_json::json!({ "seed": 1 }));
        let once = mutator::set(&root, &path, &value);
        let twice = mutator::set(&once, &path, &value);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn unset_is_idempotent(path in concrete_path_strategy()) {
        let root = Value::from(serde_json::json!({
            "a": { "b": [1, 2, 3], "c": "x" }
        }));
        let once = mutator::unset(&root, &path);
        let twice = mutator::unset(&once, &path);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn set_then_get_returns_value(path in concrete_path_strategy(), value in scalar_strategy()) {
        let written = mutator::set(&Value::map(), &path, &value);
        let read = accessor::get(&written, &path, &Value::Null);
        prop_assert_eq!(read, value);
    }
}

#[test]
fn wildcard_shape_preservation() {
    // Two wildcards with Seq parents produce depth-2 Seq nesting.
    let root = Value::from(serde_json::json!({
        "a": [ { "b": [10, 20] }, { "b": [30] } ]
    }));
    let result = accessor::get(&root, &Path::parse("a.*.b.*").unwrap(), &Value::Null);
    assert_eq!(result, Value::from(serde_json::json!([[10, 20], [30]])));

    // Map parent keeps map keying at its level.
    let root = Value::from(serde_json::json!({
        "a": { "x": { "b": [1] }, "y": { "b": [2, 3] } }
    }));
    let result = accessor::get(&root, &Path::parse("a.*.b.*").unwrap(), &Value::Null);
    assert_eq!(
        result,
        Value::from(serde_json::json!({ "x": [1], "y": [2, 3] }))
    );
}
