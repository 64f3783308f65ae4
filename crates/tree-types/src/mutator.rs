//! Structural writes into a value tree by dotted path.
//!
//! All operations are value-level immutable: the input tree is never
//! touched; the result is a new tree. Intermediate nodes are created as
//! needed, with the next segment deciding the kind (an `Index` implies a
//! Seq parent, a `Key` implies a Map parent). Wildcards broadcast: a Seq
//! value writes corresponding positions (the shorter side governs), a
//! scalar is written to every existing position.

use crate::path::{Path, Segment};
use crate::value::Value;

/// Returns a new tree with `path` set to `value`.
pub fn set(root: &Value, path: &Path, value: &Value) -> Value {
    let mut result = root.clone();
    apply_at(&mut result, &path.segments, value, WriteOp::Assign);
    result
}

/// Returns a new tree with `value` deep-merged at `path`.
///
/// Maps merge key by key, sequences concatenate, scalars are overwritten.
pub fn merge(root: &Value, path: &Path, value: &Value) -> Value {
    let mut result = root.clone();
    apply_at(&mut result, &path.segments, value, WriteOp::Merge);
    result
}

/// Returns a new tree with the leaf at `path` removed.
///
/// Intermediate containers emptied by the removal are preserved.
pub fn unset(root: &Value, path: &Path) -> Value {
    let mut result = root.clone();
    unset_at(&mut result, &path.segments, false);
    result
}

/// Like [`unset`], but prunes intermediate containers left empty.
pub fn unset_compact(root: &Value, path: &Path) -> Value {
    let mut result = root.clone();
    unset_at(&mut result, &path.segments, true);
    result
}

#[derive(Clone, Copy)]
enum WriteOp {
    Assign,
    Merge,
}

fn apply_at(node: &mut Value, segments: &[Segment], value: &Value, op: WriteOp) {
    let Some((segment, rest)) = segments.split_first() else {
        match op {
            WriteOp::Assign => *node = value.clone(),
            WriteOp::Merge => merge_values(node, value),
        }
        return;
    };

    match segment {
        Segment::Key(key) => {
            if node.as_map().is_none() {
                *node = Value::map();
            }
            let map = node.as_map_mut().expect("just ensured map");
            let child = map.entry(key.clone()).or_insert(Value::Null);
            apply_at(child, rest, value, op);
        }
        Segment::Index(index) => {
            if node.as_seq().is_none() {
                *node = Value::seq();
            }
            let seq = node.as_seq_mut().expect("just ensured seq");
            while seq.len() <= *index {
                seq.push(Value::Null);
            }
            apply_at(&mut seq[*index], rest, value, op);
        }
        Segment::Wildcard => broadcast(node, rest, value, op),
    }
}

/// Broadcasts a wildcard write over every child of `node`.
fn broadcast(node: &mut Value, rest: &[Segment], value: &Value, op: WriteOp) {
    match node {
        Value::Seq(children) => {
            if rest.is_empty() && children.is_empty() {
                // Writing a Seq through a trailing wildcard into an empty
                // sequence adopts the value positions wholesale.
                if let Value::Seq(_) = value {
                    if matches!(op, WriteOp::Assign) {
                        *node = value.clone();
                        return;
                    }
                }
            }
            for (i, child) in children.iter_mut().enumerate() {
                match value {
                    // Seq value: positional pairing, shorter side governs.
                    Value::Seq(items) => {
                        if let Some(item) = items.get(i) {
                            apply_at(child, rest, item, op);
                        }
                    }
                    _ => apply_at(child, rest, value, op),
                }
            }
        }
        Value::Map(children) => {
            for child in children.values_mut() {
                apply_at(child, rest, value, op);
            }
        }
        _ => {
            // No children to broadcast over; a trailing wildcard with a
            // Seq value still materialises the sequence.
            if rest.is_empty() {
                if let Value::Seq(_) = value {
                    if matches!(op, WriteOp::Assign) {
                        *node = value.clone();
                        return;
                    }
                }
            }
            *node = Value::seq();
        }
    }
}

/// Deep merge of `value` into `target`.
fn merge_values(target: &mut Value, value: &Value) {
    match (&mut *target, value) {
        (Value::Map(existing), Value::Map(incoming)) => {
            for (key, incoming_child) in incoming {
                match existing.get_mut(key) {
                    Some(existing_child) => merge_values(existing_child, incoming_child),
                    None => {
                        existing.insert(key.clone(), incoming_child.clone());
                    }
                }
            }
        }
        (Value::Seq(existing), Value::Seq(incoming)) => {
            existing.extend(incoming.iter().cloned());
        }
        (target, value) => *target = value.clone(),
    }
}

fn unset_at(node: &mut Value, segments: &[Segment], compact: bool) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        match (segment, &mut *node) {
            (Segment::Key(key), Value::Map(map)) => {
                map.shift_remove(key);
            }
            (Segment::Index(index), Value::Seq(seq)) => {
                if *index < seq.len() {
                    seq.remove(*index);
                }
            }
            (Segment::Wildcard, Value::Seq(seq)) => seq.clear(),
            (Segment::Wildcard, Value::Map(map)) => map.clear(),
            _ => {}
        }
        return;
    }

    match (segment, &mut *node) {
        (Segment::Key(key), Value::Map(map)) => {
            if let Some(child) = map.get_mut(key) {
                unset_at(child, rest, compact);
                if compact && is_empty_container(child) {
                    map.shift_remove(key);
                }
            }
        }
        (Segment::Index(index), Value::Seq(seq)) => {
            if let Some(child) = seq.get_mut(*index) {
                unset_at(child, rest, compact);
                if compact && is_empty_container(child) {
                    seq.remove(*index);
                }
            }
        }
        (Segment::Wildcard, Value::Seq(seq)) => {
            for child in seq.iter_mut() {
                unset_at(child, rest, compact);
            }
            if compact {
                seq.retain(|child| !is_empty_container(child));
            }
        }
        (Segment::Wildcard, Value::Map(map)) => {
            for child in map.values_mut() {
                unset_at(child, rest, compact);
            }
            if compact {
                map.retain(|_, child| !is_empty_container(child));
            }
        }
        _ => {}
    }
}

fn is_empty_container(value: &Value) -> bool {
    matches!(value, Value::Seq(_) | Value::Map(_)) && value.is_empty()
}
