//! Compiled expression representation.

use tree_types::{Path, Value};

/// One filter invocation in a pipeline: `name:arg:arg`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Value>,
}

/// The compiled form of an expression leaf.
///
/// `{{ user.email | trim | lower ?? "unknown" }}` compiles to the source
/// path `user.email`, two filter calls, and a string default. Instances
/// are created on first sight of a leaf and shared through the expression
/// cache; the executor only borrows them.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprIr {
    /// The raw leaf text the IR was compiled from.
    pub source: String,
    /// Dotted path into the source root (first segment names the source).
    pub path: Path,
    /// Pipeline, applied left to right.
    pub filters: Vec<FilterCall>,
    /// Fallback from `?? literal`, if present.
    pub default: Option<Value>,
}

impl ExprIr {
    /// True if the source path fans out over a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.path.has_wildcard()
    }
}
