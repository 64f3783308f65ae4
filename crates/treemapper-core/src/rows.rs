//! The keyed bag of candidate rows a wildcard block produces.

use std::fmt;

use tree_types::{Segment, Value};

/// Stable key of one row: the position it was fanned out from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Index(usize),
    Key(String),
}

impl RowKey {
    /// The path segment binding a wildcard to this row.
    pub fn segment(&self) -> Segment {
        match self {
            RowKey::Index(i) => Segment::Index(*i),
            RowKey::Key(k) => Segment::Key(k.clone()),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Index(i) => write!(f, "{i}"),
            RowKey::Key(k) => f.write_str(k),
        }
    }
}

/// Container kind the fan-out dimension had in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Seq,
    Map,
}

/// One candidate row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: RowKey,
    pub value: Value,
}

/// An ordered bag of rows with stable keys.
///
/// Operators consume and return row sets; they never mutate in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    pub kind: RowKind,
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(kind: RowKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, key: RowKey, value: Value) {
        self.rows.push(Row { key, value });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Emits the final value.
    ///
    /// A Map-kind fan-out always becomes a Map keyed by the original
    /// keys. A Seq-kind fan-out becomes a dense Seq when `reindex` is
    /// set; otherwise the surviving original positions are preserved as
    /// a Map keyed by their decimal rendering.
    pub fn into_value(self, reindex: bool) -> Value {
        match self.kind {
            RowKind::Map => Value::Map(
                self.rows
                    .into_iter()
                    .map(|row| (row.key.to_string(), row.value))
                    .collect(),
            ),
            RowKind::Seq if reindex => {
                Value::Seq(self.rows.into_iter().map(|row| row.value).collect())
            }
            RowKind::Seq => Value::Map(
                self.rows
                    .into_iter()
                    .map(|row| (row.key.to_string(), row.value))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RowSet {
        let mut rows = RowSet::new(RowKind::Seq);
        rows.push(RowKey::Index(0), Value::from("a"));
        rows.push(RowKey::Index(2), Value::from("c"));
        rows
    }

    #[test]
    fn reindexed_seq_is_dense() {
        let value = sample().into_value(true);
        assert_eq!(value, Value::from(serde_json::json!(["a", "c"])));
    }

    #[test]
    fn unreindexed_seq_preserves_positions() {
        let value = sample().into_value(false);
        assert_eq!(value, Value::from(serde_json::json!({ "0": "a", "2": "c" })));
    }

    #[test]
    fn map_kind_keeps_keys() {
        let mut rows = RowSet::new(RowKind::Map);
        rows.push(RowKey::Key("x".to_string()), Value::Int(1));
        rows.push(RowKey::Key("y".to_string()), Value::Int(2));

        let value = rows.into_value(true);
        assert_eq!(value, Value::from(serde_json::json!({ "x": 1, "y": 2 })));
    }
}
