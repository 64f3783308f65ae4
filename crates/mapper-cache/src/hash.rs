//! Canonical content hashing for cache keys.
//!
//! Cache keys must be stable across processes and host languages, so the
//! hash is xxh128 over a canonical byte serialisation rather than the
//! host's default hasher. Canonical form: one tag byte per variant,
//! little-endian scalars, length-prefixed UTF-8 strings, map keys sorted
//! bytewise.

use tree_types::Value;
use xxhash_rust::xxh3::xxh3_128;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_SEQ: u8 = 5;
const TAG_MAP: u8 = 6;

/// Serialises a value into its canonical byte form.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(64);
    write_value(value, &mut buffer);
    buffer
}

/// xxh128 over the canonical byte form.
pub fn content_hash(value: &Value) -> u128 {
    xxh3_128(&canonical_bytes(value))
}

/// xxh128 of a raw string (used for expression source keys).
pub fn hash_str(text: &str) -> u128 {
    xxh3_128(text.as_bytes())
}

/// xxh128 of raw bytes (used for composite cache keys).
pub fn hash_bytes(bytes: &[u8]) -> u128 {
    xxh3_128(bytes)
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(b) => {
            out.push(TAG_BOOL);
            out.push(*b as u8);
        }
        Value::Int(i) => {
            out.push(TAG_INT);
            out.extend_from_slice(&i.to_le_bytes());
        }
        Value::Float(f) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&f.to_le_bytes());
        }
        Value::String(s) => {
            out.push(TAG_STRING);
            write_str(s, out);
        }
        Value::Seq(items) => {
            out.push(TAG_SEQ);
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                write_value(item, out);
            }
        }
        Value::Map(entries) => {
            out.push(TAG_MAP);
            out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
            // Sorted keys make the encoding independent of insertion order.
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort_unstable();
            for key in keys {
                write_str(key, out);
                write_value(&entries[key.as_str()], out);
            }
        }
    }
}

fn write_str(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}
