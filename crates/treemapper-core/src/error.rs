//! Error types for the mapping engine.
//!
//! The set is closed so callers can match exhaustively. Every
//! user-visible failure carries the source or target path and, where
//! relevant, the offending expression's byte offset.

use thiserror::Error;
use tree_types::TreeError;

use crate::hooks::HookStage;

/// Errors that can occur while compiling or executing a mapping.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MapperError {
    /// A dotted path was malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// An expression leaf is missing its `{{` or `}}`.
    #[error("unterminated expression at byte {offset} in '{snippet}'")]
    UnterminatedExpression { offset: usize, snippet: String },

    /// A filter argument or default literal is malformed.
    #[error("bad literal at byte {offset} in '{snippet}': {message}")]
    BadLiteral {
        offset: usize,
        snippet: String,
        message: String,
    },

    /// A filter name is not in the registry.
    #[error("unknown filter '{name}' in '{snippet}'")]
    UnknownFilter { name: String, snippet: String },

    /// An operator key is not registered.
    #[error("unknown operator '{name}'")]
    UnknownOperator { name: String },

    /// A source path missed while strict source checking is on.
    #[error("undefined source path '{path}'")]
    UndefinedSource { path: String },

    /// A target parent is missing while strict target checking is on.
    #[error("undefined target path '{path}'")]
    UndefinedTarget { path: String },

    /// A cast filter could not coerce its input.
    #[error("cannot coerce {from} to {to} (value: {value_hint})")]
    TypeCoercion {
        from: &'static str,
        to: &'static str,
        value_hint: String,
    },

    /// A wildcard expansion exceeded the configured ceiling.
    #[error("wildcard fan-out of {observed} rows exceeds the limit of {limit}")]
    FanOutExceeded { limit: usize, observed: usize },

    /// A user hook raised.
    #[error("hook failure in {stage}: {cause}")]
    HookFailure { stage: HookStage, cause: String },

    /// Aggregate wrapper for collect mode.
    #[error("{} errors collected", .0.len())]
    Collected(Vec<MapperError>),
}

impl From<TreeError> for MapperError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::InvalidPath { path, reason } => MapperError::InvalidPath { path, reason },
            TreeError::Conversion(message) => MapperError::InvalidPath {
                path: String::new(),
                reason: message,
            },
        }
    }
}

impl MapperError {
    /// Converts a parser diagnostic, attaching the leaf source text.
    pub fn from_parse(err: template_parser::ExprParseError, source: &str) -> Self {
        match err {
            template_parser::ExprParseError::UnterminatedExpression { offset } => {
                MapperError::UnterminatedExpression {
                    offset,
                    snippet: source.to_string(),
                }
            }
            template_parser::ExprParseError::BadLiteral { offset, message } => {
                MapperError::BadLiteral {
                    offset,
                    snippet: source.to_string(),
                    message,
                }
            }
            template_parser::ExprParseError::InvalidPath(tree_err) => tree_err.into(),
        }
    }
}
