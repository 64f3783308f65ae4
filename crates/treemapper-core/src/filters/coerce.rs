//! Cast rules for the `int`, `float`, `bool`, and `string` filters.

use tree_types::Value;

use crate::error::MapperError;

/// Coerces to `Int`.
///
/// Strings must parse as whole integers; floats truncate toward zero;
/// booleans map to 0/1; null maps to 0.
pub fn to_int(value: &Value) -> Result<Value, MapperError> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Null => Ok(Value::Int(0)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| coercion_error(value, "int")),
        _ => Err(coercion_error(value, "int")),
    }
}

/// Coerces to `Float`.
///
/// As [`to_int`] but preserves the fractional part. Comma decimals are
/// not accepted.
pub fn to_float(value: &Value) -> Result<Value, MapperError> {
    match value {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Bool(b) => Ok(Value::Float(*b as i64 as f64)),
        Value::Null => Ok(Value::Float(0.0)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| coercion_error(value, "float")),
        _ => Err(coercion_error(value, "float")),
    }
}

/// Coerces to `Bool`.
///
/// Case-insensitive `"1"`, `"true"`, `"yes"`, `"on"` are true;
/// `"0"`, `"false"`, `"no"`, `"off"`, `""` are false; numeric zero is
/// false; null is false.
pub fn to_bool(value: &Value) -> Result<Value, MapperError> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Int(i) => Ok(Value::Bool(*i != 0)),
        Value::Float(f) => Ok(Value::Bool(*f != 0.0)),
        Value::Null => Ok(Value::Bool(false)),
        Value::String(s) => {
            let lowered = s.trim().to_ascii_lowercase();
            match lowered.as_str() {
                "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
                "0" | "false" | "no" | "off" | "" => Ok(Value::Bool(false)),
                _ => Err(coercion_error(value, "bool")),
            }
        }
        _ => Err(coercion_error(value, "bool")),
    }
}

/// Coerces to `String`. Null becomes the empty string; containers fail.
pub fn to_string_value(value: &Value) -> Result<Value, MapperError> {
    match value {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Int(i) => Ok(Value::String(i.to_string())),
        Value::Float(f) => Ok(Value::String(f.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Null => Ok(Value::String(String::new())),
        _ => Err(coercion_error(value, "string")),
    }
}

/// Numeric view used by `between` and `clamp`; strings go through the
/// float rules.
pub fn as_number(value: &Value) -> Result<f64, MapperError> {
    match to_float(value)? {
        Value::Float(f) => Ok(f),
        _ => unreachable!("to_float returns Float"),
    }
}

fn coercion_error(value: &Value, to: &'static str) -> MapperError {
    let mut hint = value.to_string();
    if hint.len() > 40 {
        let cut = (0..=40).rev().find(|i| hint.is_char_boundary(*i)).unwrap_or(0);
        hint.truncate(cut);
        hint.push('…');
    }
    MapperError::TypeCoercion {
        from: value.kind(),
        to,
        value_hint: hint,
    }
}
