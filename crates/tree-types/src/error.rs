//! Error types for the tree value model.

use thiserror::Error;

/// Errors raised by path parsing and value conversion.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    /// A dotted path was malformed (empty segment, empty path).
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A value could not be converted into the requested shape.
    #[error("conversion error: {0}")]
    Conversion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_display() {
        let err = TreeError::InvalidPath {
            path: "a..b".to_string(),
            reason: "empty segment".to_string(),
        };
        assert_eq!(err.to_string(), "invalid path 'a..b': empty segment");
    }
}
