//! Built-in filters.
//!
//! Scalar filters pass non-matching kinds through unchanged so the
//! pipeline stays total; only the cast filters raise `TypeCoercion`.

use tree_types::Value;

use crate::error::MapperError;
use crate::filters::coerce;
use crate::filters::{FilterRegistry, FilterResult};

fn ok(value: Value) -> Result<FilterResult, MapperError> {
    Ok(FilterResult::Value(value))
}

/// Seeds `registry` with every built-in filter.
pub fn register_builtins(registry: &FilterRegistry) {
    // ── String casing / whitespace ──

    registry.register("trim", false, |value, _| match value {
        Value::String(s) => ok(Value::from(s.trim())),
        other => ok(other.clone()),
    });

    registry.register("upper", false, |value, _| match value {
        Value::String(s) => ok(Value::from(s.to_uppercase())),
        other => ok(other.clone()),
    });

    registry.register("lower", false, |value, _| match value {
        Value::String(s) => ok(Value::from(s.to_lowercase())),
        other => ok(other.clone()),
    });

    registry.register("ucfirst", false, |value, _| match value {
        Value::String(s) => ok(Value::from(ucfirst(s))),
        other => ok(other.clone()),
    });

    registry.register("ucwords", false, |value, _| match value {
        Value::String(s) => {
            let words: Vec<String> = s.split(' ').map(ucfirst).collect();
            ok(Value::from(words.join(" ")))
        }
        other => ok(other.clone()),
    });

    registry.register("replace", false, |value, args| match value {
        Value::String(s) => {
            let from = string_arg(args, 0);
            let to = string_arg(args, 1);
            if from.is_empty() {
                return ok(value.clone());
            }
            ok(Value::from(s.replace(&from, &to)))
        }
        other => ok(other.clone()),
    });

    registry.register("strip_tags", false, |value, _| match value {
        Value::String(s) => ok(Value::from(strip_tags(s))),
        other => ok(other.clone()),
    });

    // ── Defaults ──

    registry.register("default", false, |value, args| {
        if value.is_null() {
            ok(args.first().cloned().unwrap_or(Value::Null))
        } else {
            ok(value.clone())
        }
    });

    // ── Numerics ──

    registry.register("between", false, |value, args| {
        let number = coerce::as_number(value)?;
        let lo = numeric_arg(args, 0)?;
        let hi = numeric_arg(args, 1)?;
        ok(Value::Bool(number >= lo && number <= hi))
    });

    registry.register("clamp", false, |value, args| {
        let a = numeric_arg(args, 0)?;
        let b = numeric_arg(args, 1)?;
        if a.is_nan() || b.is_nan() {
            return Err(MapperError::TypeCoercion {
                from: "float",
                to: "clamp bound",
                value_hint: format!("{a}:{b}"),
            });
        }
        // Bounds are normalised so a reversed pair cannot panic.
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        match value {
            Value::Int(i) if int_bounds(args) => {
                ok(Value::Int((*i).clamp(lo as i64, hi as i64)))
            }
            other => {
                let number = coerce::as_number(other)?;
                ok(Value::Float(number.clamp(lo, hi)))
            }
        }
    });

    // ── Casts ──

    registry.register("int", false, |value, _| coerce::to_int(value).map(FilterResult::Value));
    registry.register("float", false, |value, _| {
        coerce::to_float(value).map(FilterResult::Value)
    });
    registry.register("bool", false, |value, _| {
        coerce::to_bool(value).map(FilterResult::Value)
    });
    registry.register("string", false, |value, _| {
        coerce::to_string_value(value).map(FilterResult::Value)
    });

    // ── Emptiness ──

    registry.register("empty_to_null", true, |value, args| {
        let modes = mode_set(args);
        let null = match value {
            Value::String(s) if s.is_empty() => true,
            Value::Seq(items) if items.is_empty() => true,
            Value::Int(0) if modes.contains(&"zero") => true,
            Value::Float(f) if *f == 0.0 && modes.contains(&"zero") => true,
            Value::String(s) if s == "0" && modes.contains(&"string_zero") => true,
            Value::Bool(false) if modes.contains(&"false") => true,
            _ => false,
        };
        if null {
            ok(Value::Null)
        } else {
            ok(value.clone())
        }
    });

    // ── Sequence-aware ──

    registry.register("join", true, |value, args| match value {
        Value::Seq(items) => {
            let separator = string_arg(args, 0);
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match coerce::to_string_value(item)? {
                    Value::String(s) => parts.push(s),
                    _ => unreachable!("to_string_value returns String"),
                }
            }
            ok(Value::from(parts.join(&separator)))
        }
        other => ok(other.clone()),
    });

    registry.register("count", true, |value, _| {
        let count = match value {
            Value::Seq(items) => items.len() as i64,
            Value::Map(entries) => entries.len() as i64,
            Value::Null => 0,
            _ => 1,
        };
        ok(Value::Int(count))
    });

    registry.register("first", true, |value, _| match value {
        Value::Seq(items) => match items.first() {
            Some(first) => ok(first.clone()),
            None => Ok(FilterResult::Absent),
        },
        Value::Map(entries) => match entries.values().next() {
            Some(first) => ok(first.clone()),
            None => Ok(FilterResult::Absent),
        },
        other => ok(other.clone()),
    });

    registry.register("last", true, |value, _| match value {
        Value::Seq(items) => match items.last() {
            Some(last) => ok(last.clone()),
            None => Ok(FilterResult::Absent),
        },
        Value::Map(entries) => match entries.values().last() {
            Some(last) => ok(last.clone()),
            None => Ok(FilterResult::Absent),
        },
        other => ok(other.clone()),
    });

    registry.register("reverse", true, |value, _| match value {
        Value::Seq(items) => ok(Value::Seq(items.iter().rev().cloned().collect())),
        Value::String(s) => ok(Value::from(s.chars().rev().collect::<String>())),
        Value::Map(entries) => ok(Value::Map(
            entries.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )),
        other => ok(other.clone()),
    });

    registry.register("unique", true, |value, _| match value {
        Value::Seq(items) => {
            let mut seen: Vec<Value> = Vec::new();
            for item in items {
                if !seen.contains(item) {
                    seen.push(item.clone());
                }
            }
            ok(Value::Seq(seen))
        }
        other => ok(other.clone()),
    });

    registry.register("keys", true, |value, _| match value {
        Value::Map(entries) => ok(Value::Seq(
            entries.keys().map(|k| Value::from(k.as_str())).collect(),
        )),
        Value::Seq(items) => ok(Value::Seq((0..items.len() as i64).map(Value::Int).collect())),
        other => ok(other.clone()),
    });

    registry.register("values", true, |value, _| match value {
        Value::Map(entries) => ok(Value::Seq(entries.values().cloned().collect())),
        other => ok(other.clone()),
    });
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Removes HTML-like tags, keeping text content.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Stringifies an argument; missing args read as the empty string.
fn string_arg(args: &[Value], index: usize) -> String {
    args.get(index)
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

fn numeric_arg(args: &[Value], index: usize) -> Result<f64, MapperError> {
    coerce::as_number(args.get(index).unwrap_or(&Value::Null))
}

/// Both clamp bounds are integer literals.
fn int_bounds(args: &[Value]) -> bool {
    args.len() >= 2 && matches!(args[0], Value::Int(_)) && matches!(args[1], Value::Int(_))
}

/// Mode flags for `empty_to_null`: each string argument contributes a
/// comma-separated list.
fn mode_set(args: &[Value]) -> Vec<&str> {
    let mut modes = Vec::new();
    for arg in args {
        if let Value::String(s) = arg {
            modes.extend(s.split(',').map(str::trim).filter(|m| !m.is_empty()));
        }
    }
    modes
}
