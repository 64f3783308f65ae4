//! Shape-preserving reads from a value tree by dotted path.
//!
//! Reads are total: a missing key, an out-of-range index, or a kind
//! mismatch yields the caller's default at that branch, never a panic.
//! Wildcards fan out and collect with the parent's container kind: a Seq
//! parent collects a Seq in original order, a Map parent collects a Map
//! keyed by the original keys. Nested wildcards nest the same way.

use crate::path::{Path, Segment};
use crate::value::Value;

/// Reads the value at `path`, falling back to `default` on any miss.
pub fn get(root: &Value, path: &Path, default: &Value) -> Value {
    let mut prefix = Vec::new();
    descend(root, &path.segments, default, &mut prefix, &mut None)
}

/// Like [`get`], but also reports every concrete miss.
///
/// Each reported path is fully bound (wildcards replaced by the position
/// they were visiting when the miss occurred). The mapping executor uses
/// this to raise strict-source errors per missing leaf.
pub fn get_traced(root: &Value, path: &Path, default: &Value) -> (Value, Vec<Path>) {
    let mut prefix = Vec::new();
    let mut misses = Some(Vec::new());
    let value = descend(root, &path.segments, default, &mut prefix, &mut misses);
    (value, misses.unwrap_or_default())
}

fn descend(
    node: &Value,
    segments: &[Segment],
    default: &Value,
    prefix: &mut Vec<Segment>,
    misses: &mut Option<Vec<Path>>,
) -> Value {
    let Some((segment, rest)) = segments.split_first() else {
        return node.clone();
    };

    match segment {
        Segment::Key(key) => match node.as_map().and_then(|m| m.get(key)) {
            Some(child) => {
                prefix.push(segment.clone());
                let result = descend(child, rest, default, prefix, misses);
                prefix.pop();
                result
            }
            None => miss(segments, default, prefix, misses),
        },
        Segment::Index(index) => match node.as_seq().and_then(|s| s.get(*index)) {
            Some(child) => {
                prefix.push(segment.clone());
                let result = descend(child, rest, default, prefix, misses);
                prefix.pop();
                result
            }
            None => miss(segments, default, prefix, misses),
        },
        Segment::Wildcard => match node {
            Value::Seq(children) => {
                let mut collected = Vec::with_capacity(children.len());
                for (i, child) in children.iter().enumerate() {
                    prefix.push(Segment::Index(i));
                    collected.push(descend(child, rest, default, prefix, misses));
                    prefix.pop();
                }
                Value::Seq(collected)
            }
            Value::Map(children) => {
                let mut collected = indexmap::IndexMap::with_capacity(children.len());
                for (key, child) in children {
                    prefix.push(Segment::Key(key.clone()));
                    collected.insert(key.clone(), descend(child, rest, default, prefix, misses));
                    prefix.pop();
                }
                Value::Map(collected)
            }
            _ => miss(segments, default, prefix, misses),
        },
    }
}

/// Records the fully-bound miss path and returns the default.
fn miss(
    remaining: &[Segment],
    default: &Value,
    prefix: &[Segment],
    misses: &mut Option<Vec<Path>>,
) -> Value {
    if let Some(buffer) = misses {
        let mut segments = prefix.to_vec();
        segments.extend(remaining.iter().cloned());
        buffer.push(Path::from_segments(segments));
    }
    default.clone()
}
