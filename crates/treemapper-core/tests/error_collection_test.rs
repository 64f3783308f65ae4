//! Exception policy behaviour: collect, fail-fast, silent, strictness.

use tree_types::Value;
use treemapper_core::{
    query, ExceptionPolicy, MapOptions, Mapper, MapperError, MapperExceptions, Sources,
};

fn json(v: serde_json::Value) -> Value {
    Value::from(v)
}

fn collecting_policy() -> ExceptionPolicy {
    ExceptionPolicy {
        collect: true,
        throw_on_undefined_source: true,
        ..ExceptionPolicy::default()
    }
}

#[test]
fn strict_source_misses_collect_per_leaf() {
    let result = query()
        .source(
            "users",
            json(serde_json::json!([{ "name": "John" }, { "name": "Jane" }])),
        )
        .template(json(serde_json::json!({
            "contacts": {
                "*": { "name": "{{ users.*.name }}", "email": "{{ users.*.email }}" }
            }
        })))
        .policy(collecting_policy())
        .map()
        .unwrap();

    assert_eq!(
        result,
        json(serde_json::json!({
            "contacts": [{ "name": "John" }, { "name": "Jane" }]
        }))
    );

    let errors = MapperExceptions::get_errors();
    assert_eq!(
        errors,
        vec![
            MapperError::UndefinedSource { path: "users.0.email".to_string() },
            MapperError::UndefinedSource { path: "users.1.email".to_string() },
        ]
    );
    assert!(MapperExceptions::has_errors());
}

#[test]
fn error_sequences_are_deterministic() {
    let sources = Sources::new().with(
        "users",
        json(serde_json::json!([{ "name": "a" }, { "name": "b" }, { "name": "c" }])),
    );
    let template = json(serde_json::json!({
        "rows": { "*": { "m": "{{ users.*.missing }}", "n": "{{ users.*.name }}" } }
    }));
    let options = MapOptions {
        policy: Some(collecting_policy()),
        ..MapOptions::default()
    };

    let _ = Mapper::map(&sources, &template, &options).unwrap();
    let first = MapperExceptions::get_errors();

    let _ = Mapper::map(&sources, &template, &options).unwrap();
    let second = MapperExceptions::get_errors();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn fail_fast_raises_the_first_error() {
    let err = query()
        .source("users", json(serde_json::json!([{ "name": "John" }])))
        .template(json(serde_json::json!({
            "contacts": { "*": { "email": "{{ users.*.email }}" } }
        })))
        .policy(ExceptionPolicy {
            throw_on_undefined_source: true,
            ..ExceptionPolicy::default()
        })
        .map()
        .unwrap_err();

    assert_eq!(
        err,
        MapperError::UndefinedSource { path: "users.0.email".to_string() }
    );
}

#[test]
fn accumulator_resets_per_call_by_default() {
    let sources = Sources::new().with("u", json(serde_json::json!({})));
    let broken = json(serde_json::json!({ "x": "{{ u.missing }}" }));
    let options = MapOptions {
        policy: Some(collecting_policy()),
        ..MapOptions::default()
    };

    let _ = Mapper::map(&sources, &broken, &options).unwrap();
    assert_eq!(MapperExceptions::get_errors().len(), 1);

    // A clean call wipes the previous call's buffer.
    let clean = json(serde_json::json!({ "y": 1 }));
    let _ = Mapper::map(&sources, &clean, &options).unwrap();
    assert!(!MapperExceptions::has_errors());
}

#[test]
fn preserve_errors_accumulates_across_calls() {
    let sources = Sources::new().with("u", json(serde_json::json!({})));
    let broken = json(serde_json::json!({ "x": "{{ u.missing }}" }));

    MapperExceptions::clear_errors();
    let options = MapOptions {
        policy: Some(collecting_policy()),
        preserve_errors: true,
        ..MapOptions::default()
    };
    let _ = Mapper::map(&sources, &broken, &options).unwrap();
    let _ = Mapper::map(&sources, &broken, &options).unwrap();

    assert_eq!(MapperExceptions::get_errors().len(), 2);

    match MapperExceptions::collected() {
        Some(MapperError::Collected(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected Collected, got {other:?}"),
    }
    MapperExceptions::clear_errors();
}

#[test]
fn unknown_filter_is_reported_once_per_leaf() {
    let result = query()
        .source(
            "users",
            json(serde_json::json!([{ "n": "a" }, { "n": "b" }, { "n": "c" }])),
        )
        .template(json(serde_json::json!({
            "rows": { "*": { "n": "{{ users.*.n | no_such_filter }}" } }
        })))
        .policy(ExceptionPolicy {
            collect: true,
            ..ExceptionPolicy::default()
        })
        .map()
        .unwrap();

    // Three rows hit the same unknown filter; one diagnostic.
    let errors = MapperExceptions::get_errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        MapperError::UnknownFilter { ref name, .. } if name == "no_such_filter"
    ));
    assert_eq!(result, json(serde_json::json!({ "rows": [{}, {}, {}] })));
}

#[test]
fn thread_local_facade_drives_policy() {
    MapperExceptions::reset();
    MapperExceptions::set_collect(true);
    MapperExceptions::set_throw_on_undefined_source(true);

    let result = query()
        .source("u", json(serde_json::json!({ "a": 1 })))
        .template(json(serde_json::json!({ "a": "{{ u.a }}", "b": "{{ u.b }}" })))
        .map()
        .unwrap();

    assert_eq!(result, json(serde_json::json!({ "a": 1 })));
    assert!(MapperExceptions::has_errors());

    MapperExceptions::reset();
    assert!(!MapperExceptions::has_errors());
}

#[test]
fn type_coercion_failures_are_path_tagged_and_collected() {
    let result = query()
        .source("u", json(serde_json::json!({ "age": "not-a-number" })))
        .template(json(serde_json::json!({ "age": "{{ u.age | int ?? 0 }}" })))
        .policy(ExceptionPolicy {
            collect: true,
            ..ExceptionPolicy::default()
        })
        .map()
        .unwrap();

    // The failed cast falls back to the expression default.
    assert_eq!(result, json(serde_json::json!({ "age": 0 })));

    let errors = MapperExceptions::get_errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], MapperError::TypeCoercion { to: "int", .. }));
}
