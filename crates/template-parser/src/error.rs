//! Parser diagnostics with byte offsets into the leaf source string.

use thiserror::Error;
use tree_types::TreeError;

/// Errors raised while compiling an expression leaf.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExprParseError {
    /// The leaf does not open with `{{` or is missing the closing `}}`.
    #[error("unterminated expression at byte {offset}")]
    UnterminatedExpression { offset: usize },

    /// A filter argument or default literal is malformed.
    #[error("bad literal at byte {offset}: {message}")]
    BadLiteral { offset: usize, message: String },

    /// The source path between the braces is malformed.
    #[error(transparent)]
    InvalidPath(#[from] TreeError),
}

impl ExprParseError {
    /// The byte offset the diagnostic points at, where applicable.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ExprParseError::UnterminatedExpression { offset } => Some(*offset),
            ExprParseError::BadLiteral { offset, .. } => Some(*offset),
            ExprParseError::InvalidPath(_) => None,
        }
    }
}
