//! Compiles expression leaves into [`ExprIr`].
//!
//! Grammar:
//!
//! ```text
//! expression := "{{" path ("|" filter)* ("??" literal)? "}}"
//! filter     := ident (":" arg (":" arg)*)?
//! arg        := literal
//! literal    := quoted_string | number | "true" | "false" | "null"
//! ```
//!
//! The parser is pure; diagnostics carry byte offsets into the leaf
//! source string. Successful results are cached by xxh128 of the leaf
//! text, bounded by an LRU.

use std::sync::Arc;

use once_cell::sync::Lazy;

use mapper_cache::{hash_str, register_clearable, CacheStats, LruMemo};
use tree_types::Path;

use crate::error::ExprParseError;
use crate::ir::{ExprIr, FilterCall};
use crate::lexer::{self, LexMode};

/// Default bound of the expression cache.
pub const DEFAULT_EXPRESSION_CAPACITY: usize = 1024;

static EXPRESSION_CACHE: Lazy<LruMemo<Arc<ExprIr>>> = Lazy::new(|| {
    register_clearable(
        "expression-parser",
        Arc::new(|| ExpressionParser::clear_cache()),
    );
    LruMemo::new(DEFAULT_EXPRESSION_CAPACITY)
});

/// True if the whole string is a single expression leaf.
///
/// A string with interpolations in the middle (`"id: {{ a.b }}"`) is a
/// literal, not an expression.
pub fn is_expression(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= 4
        && trimmed.starts_with("{{")
        && trimmed.ends_with("}}")
        && !trimmed[2..trimmed.len() - 2].contains("}}")
}

/// Parses an expression leaf without touching the cache.
pub fn parse_expression(source: &str) -> Result<ExprIr, ExprParseError> {
    let mode = lexer::lex_mode();

    let open = match source.find("{{") {
        Some(pos) if source[..pos].trim().is_empty() => pos,
        _ => return Err(ExprParseError::UnterminatedExpression { offset: 0 }),
    };
    let close = match source.rfind("}}") {
        Some(pos) if pos > open && source[pos + 2..].trim().is_empty() => pos,
        _ => {
            return Err(ExprParseError::UnterminatedExpression {
                offset: source.len(),
            })
        }
    };

    let inner = &source[open + 2..close];
    let base = open + 2;

    // Default clause: first top-level `??` splits pipeline from literal.
    let (pipeline, default) = match lexer::find_outside_quotes(inner, "??", mode) {
        Some(pos) => {
            let literal_text = &inner[pos + 2..];
            let literal = lexer::parse_literal(literal_text, base + pos + 2, mode)?;
            (&inner[..pos], Some(literal))
        }
        None => (inner, None),
    };

    let mut stages = lexer::split_outside_quotes(pipeline, base, "|", mode).into_iter();

    let (path_offset, path_text) = stages.next().expect("split yields at least one piece");
    let path_text = path_text.trim();
    if path_text.is_empty() {
        return Err(ExprParseError::BadLiteral {
            offset: path_offset,
            message: "missing source path".to_string(),
        });
    }
    let path = Path::parse(path_text)?;

    let mut filters = Vec::new();
    for (stage_offset, stage_text) in stages {
        filters.push(parse_filter(stage_text, stage_offset, mode)?);
    }

    Ok(ExprIr {
        source: source.to_string(),
        path,
        filters,
        default,
    })
}

fn parse_filter(text: &str, offset: usize, mode: LexMode) -> Result<FilterCall, ExprParseError> {
    let mut parts = lexer::split_outside_quotes(text, offset, ":", mode).into_iter();

    let (name_offset, name_text) = parts.next().expect("split yields at least one piece");
    let name = name_text.trim();
    if !is_ident(name) {
        return Err(ExprParseError::BadLiteral {
            offset: name_offset,
            message: format!("invalid filter name '{name}'"),
        });
    }

    let mut args = Vec::new();
    for (arg_offset, arg_text) in parts {
        args.push(lexer::parse_literal(arg_text, arg_offset, mode)?);
    }

    Ok(FilterCall {
        name: name.to_string(),
        args,
    })
}

fn is_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The cached parsing front.
///
/// Results are keyed by xxh128 of the leaf source string; eviction is
/// LRU under the configured bound. Parse failures are not cached.
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parses through the cache.
    pub fn parse(source: &str) -> Result<Arc<ExprIr>, ExprParseError> {
        let key = hash_str(source);
        if let Some(hit) = EXPRESSION_CACHE.get(key) {
            return Ok(hit);
        }
        let ir = Arc::new(parse_expression(source)?);
        EXPRESSION_CACHE.put(key, Arc::clone(&ir));
        Ok(ir)
    }

    /// Size, bound, and usage of the expression cache.
    pub fn cache_stats() -> CacheStats {
        EXPRESSION_CACHE.stats()
    }

    pub fn clear_cache() {
        EXPRESSION_CACHE.clear();
    }

    /// Rebounds the cache, evicting LRU entries if shrinking.
    pub fn resize_cache(max_entries: usize) {
        EXPRESSION_CACHE.resize(max_entries);
    }
}
