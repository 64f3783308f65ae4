//! Dotted paths addressing into a [`Value`](crate::Value) tree.
//!
//! A path is an ordered list of segments joined by `.` in text form.
//! Whole-number segments address sequence positions, `*` fans out over
//! every child of the current node, and anything else addresses a map key.
//! Escaping is not supported; keys containing `.` are out of scope.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Addresses a map entry by key.
    Key(String),
    /// Addresses a sequence entry by position.
    Index(usize),
    /// Matches every entry of the current node.
    Wildcard,
}

impl Segment {
    /// Builds a key segment.
    pub fn key(k: impl Into<String>) -> Self {
        Segment::Key(k.into())
    }

    /// Builds an index segment.
    pub fn index(i: usize) -> Self {
        Segment::Index(i)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
            Segment::Wildcard => f.write_str("*"),
        }
    }
}

/// An ordered segment list addressing into a value tree.
///
/// `parse` and the `Display` impl are inverses: for every well-formed
/// path `p`, `Path::parse(&p.to_string()) == Ok(p)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    pub segments: Vec<Segment>,
}

impl Path {
    /// Parses a dotted path.
    ///
    /// Classification per segment: all-digit → [`Segment::Index`], `*` →
    /// [`Segment::Wildcard`], otherwise [`Segment::Key`]. An empty segment
    /// (including an empty path, or leading/trailing/double dots) is an
    /// [`TreeError::InvalidPath`].
    ///
    /// Examples:
    /// - `"a.0.b"` → `Key("a"), Index(0), Key("b")`
    /// - `"items.*.name"` → `Key("items"), Wildcard, Key("name")`
    pub fn parse(text: &str) -> Result<Self, TreeError> {
        if text.is_empty() {
            return Err(TreeError::InvalidPath {
                path: text.to_string(),
                reason: "empty path".to_string(),
            });
        }

        let mut segments = Vec::new();
        for part in text.split('.') {
            if part.is_empty() {
                return Err(TreeError::InvalidPath {
                    path: text.to_string(),
                    reason: "empty segment".to_string(),
                });
            }
            segments.push(classify(part));
        }

        Ok(Self { segments })
    }

    /// Builds a path directly from segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// The textual form; inverse of [`Path::parse`].
    pub fn emit(&self) -> String {
        self.to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if any segment is a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Wildcard))
    }

    /// Number of wildcard segments.
    pub fn wildcard_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Wildcard))
            .count()
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Returns a copy with `segment` appended.
    pub fn with_segment(&self, segment: Segment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Replaces the first wildcard segment with `replacement`.
    ///
    /// Used when binding a fan-out position: `items.*.name` bound to
    /// index 2 becomes `items.2.name`. Returns `None` if the path holds
    /// no wildcard.
    pub fn bind_first_wildcard(&self, replacement: Segment) -> Option<Self> {
        let pos = self
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Wildcard))?;
        let mut bound = self.clone();
        bound.segments[pos] = replacement;
        Some(bound)
    }
}

/// Classifies one textual segment.
fn classify(part: &str) -> Segment {
    if part == "*" {
        return Segment::Wildcard;
    }
    if part.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(index) = part.parse::<usize>() {
            return Segment::Index(index);
        }
    }
    Segment::Key(part.to_string())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = TreeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Path::parse(&s)
    }
}

impl From<Path> for String {
    fn from(p: Path) -> Self {
        p.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keys_indices_and_wildcards() {
        let path = Path::parse("a.0.b").unwrap();
        assert_eq!(
            path.segments,
            vec![Segment::key("a"), Segment::index(0), Segment::key("b")]
        );

        let path = Path::parse("items.*.name").unwrap();
        assert_eq!(
            path.segments,
            vec![Segment::key("items"), Segment::Wildcard, Segment::key("name")]
        );
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(Path::parse("").is_err());
        assert!(Path::parse("a..b").is_err());
        assert!(Path::parse(".a").is_err());
        assert!(Path::parse("a.").is_err());
    }

    #[test]
    fn digit_segments_become_indices() {
        let path = Path::parse("0.10.007").unwrap();
        assert_eq!(
            path.segments,
            vec![Segment::index(0), Segment::index(10), Segment::index(7)]
        );
    }

    #[test]
    fn mixed_alphanumeric_segments_are_keys() {
        let path = Path::parse("a1.2b").unwrap();
        assert_eq!(path.segments, vec![Segment::key("a1"), Segment::key("2b")]);
    }

    #[test]
    fn emit_is_the_inverse_of_parse() {
        for text in ["a.0.b", "items.*.name", "x", "*.*", "profile.emails.1"] {
            let path = Path::parse(text).unwrap();
            assert_eq!(path.emit(), text);
            assert_eq!(Path::parse(&path.emit()).unwrap(), path);
        }
    }

    #[test]
    fn wildcard_helpers() {
        let path = Path::parse("a.*.b.*.c").unwrap();
        assert!(path.has_wildcard());
        assert_eq!(path.wildcard_count(), 2);
        assert!(!Path::parse("a.b").unwrap().has_wildcard());
    }

    #[test]
    fn bind_first_wildcard_replaces_outermost() {
        let path = Path::parse("a.*.b.*").unwrap();
        let bound = path.bind_first_wildcard(Segment::index(3)).unwrap();
        assert_eq!(bound.emit(), "a.3.b.*");
        assert!(Path::parse("a.b").unwrap().bind_first_wildcard(Segment::index(0)).is_none());
    }

    #[test]
    fn serde_uses_text_form() {
        let path = Path::parse("items.*.name").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""items.*.name""#);
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
